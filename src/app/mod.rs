//! Application use cases and transactions.

mod fish;
mod user;

pub use fish::{
    fish_all_coordinates, fish_create, fish_delete, fish_for_user, fish_for_user_on_date,
    fish_get, FishCoordinateDto, FishCreateReq, FishDto, LocationInfo,
};
pub use user::{
    user_create, user_delete, user_find_by_email, user_get, user_update_name, UserCreateReq,
    UserDto,
};
