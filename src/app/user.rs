//! User use cases.

use crate::domain::fish_list;
use crate::error::AppError;
use crate::infra::get_connection;
use crate::infra::DbPool;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

/// Raw user row before the catch list is decoded.
type UserRawRow = (
    i64,            // id
    String,         // name
    String,         // email
    Option<String>, // photo
    String,         // fish_ids (JSON)
    i64,            // is_subscriber
    Option<String>, // subscribe_at
    i64,            // subscribe_period
);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateReq {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub photo: Option<String>,
    pub fish_ids: Vec<i64>,
    pub is_subscriber: bool,
    pub subscribe_at: Option<String>,
    pub subscribe_period: i64,
}

const USER_SELECT: &str = "SELECT id, name, email, photo, fish_ids, is_subscriber, subscribe_at, subscribe_period FROM user";

fn map_user_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<UserRawRow> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
    ))
}

fn raw_to_dto(raw: UserRawRow) -> Result<UserDto, AppError> {
    Ok(UserDto {
        id: raw.0,
        name: raw.1,
        email: raw.2,
        photo: raw.3,
        fish_ids: fish_list::decode(&raw.4)?,
        is_subscriber: raw.5 != 0,
        subscribe_at: raw.6,
        subscribe_period: raw.7,
    })
}

fn user_raw_by_id(conn: &Connection, user_id: i64) -> Result<Option<UserRawRow>, AppError> {
    conn.query_row(
        &format!("{} WHERE id = ?1", USER_SELECT),
        [user_id],
        map_user_row,
    )
    .optional()
    .map_err(|e| AppError::Db(e.to_string()))
}

/// Identity lookup used by the auth layer before `user_create`. Absence is
/// not an error.
pub fn user_find_by_email(pool: &DbPool, email: &str) -> Result<Option<UserDto>, AppError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("email is required".into()));
    }
    let conn = get_connection(pool);
    let raw = conn
        .query_row(
            &format!("{} WHERE email = ?1", USER_SELECT),
            [email],
            map_user_row,
        )
        .optional()
        .map_err(|e| AppError::Db(e.to_string()))?;
    raw.map(raw_to_dto).transpose()
}

pub fn user_get(pool: &DbPool, user_id: i64) -> Result<UserDto, AppError> {
    let conn = get_connection(pool);
    match user_raw_by_id(&conn, user_id)? {
        Some(raw) => raw_to_dto(raw),
        None => Err(AppError::NotFound(format!("user {}", user_id))),
    }
}

/// Insert a new user with an empty catch list and return the stored row.
/// Callers are expected to probe with `user_find_by_email` first; a duplicate
/// email still fails with a conflict via the UNIQUE constraint.
pub fn user_create(pool: &DbPool, req: UserCreateReq) -> Result<UserDto, AppError> {
    let email = req.email.trim();
    let name = req.name.trim();
    if email.is_empty() {
        return Err(AppError::Validation("email is required".into()));
    }
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }

    let conn = get_connection(pool);
    conn.execute(
        "INSERT INTO user (name, email) VALUES (?1, ?2)",
        params![name, email],
    )?;
    let id = conn.last_insert_rowid();

    match user_raw_by_id(&conn, id)? {
        Some(raw) => raw_to_dto(raw),
        None => Err(AppError::Db(format!("user {} vanished after insert", id))),
    }
}

/// Rename a user. Only `name` is mutable through this operation.
pub fn user_update_name(pool: &DbPool, user_id: i64, name: &str) -> Result<UserDto, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    {
        let conn = get_connection(pool);
        let affected = conn
            .execute(
                "UPDATE user SET name = ?1 WHERE id = ?2",
                params![name, user_id],
            )
            .map_err(|e| AppError::Db(e.to_string()))?;
        if affected == 0 {
            return Err(AppError::NotFound(format!("user {}", user_id)));
        }
    } // release conn before calling user_get to avoid deadlock
    user_get(pool, user_id)
}

/// Remove a user and every fish row they wrote, as one atomic unit. Not
/// reachable from the current screens, but the cascade keeps writer
/// references valid for any caller that does reach it.
pub fn user_delete(pool: &DbPool, user_id: i64) -> Result<(), AppError> {
    let conn = get_connection(pool);
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| AppError::Db(e.to_string()))?;

    tx.execute("DELETE FROM fish WHERE writer = ?1", [user_id])
        .map_err(|e| AppError::Db(e.to_string()))?;
    let affected = tx
        .execute("DELETE FROM user WHERE id = ?1", [user_id])
        .map_err(|e| AppError::Db(e.to_string()))?;
    if affected == 0 {
        return Err(AppError::NotFound(format!("user {}", user_id)));
    }

    tx.commit().map_err(|e| AppError::Db(e.to_string()))?;
    Ok(())
}
