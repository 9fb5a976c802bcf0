//! User CRUD integration tests

use creel::app::{
    fish_create, fish_get, user_create, user_delete, user_find_by_email, user_get,
    user_update_name, FishCreateReq, LocationInfo, UserCreateReq,
};
use creel::infra::db::{init_test_db, DEFAULT_USER_EMAIL, DEFAULT_USER_NAME};

// ──────────────────────── Helpers ────────────────────────

fn make_create_req(name: &str) -> UserCreateReq {
    UserCreateReq {
        email: format!("{}@test.com", name.to_lowercase()),
        name: name.to_string(),
    }
}

fn make_fish_req(writer: i64, name: &str) -> FishCreateReq {
    FishCreateReq {
        name: name.to_string(),
        kind: "Bass".to_string(),
        photo: "aGVsbG8=".to_string(),
        location: LocationInfo {
            latitude: 49.2,
            longitude: -123.1,
            name: "Pier".to_string(),
        },
        date: "2025-06-01".to_string(),
        writer,
        notes: None,
    }
}

// ══════════════════════════════════════════════════════════
//  user_create
// ══════════════════════════════════════════════════════════

#[test]
fn create_user_returns_dto_with_empty_catch_list() {
    let pool = init_test_db();
    let dto = user_create(&pool, make_create_req("Alice")).unwrap();
    assert!(dto.id > 0);
    assert_eq!(dto.name, "Alice");
    assert_eq!(dto.email, "alice@test.com");
    assert!(dto.fish_ids.is_empty());
    assert!(!dto.is_subscriber);
    assert_eq!(dto.subscribe_period, 0);
    assert!(dto.photo.is_none());
}

#[test]
fn create_user_trims_fields() {
    let pool = init_test_db();
    let dto = user_create(
        &pool,
        UserCreateReq {
            email: "  bob@test.com  ".to_string(),
            name: "  Bob  ".to_string(),
        },
    )
    .unwrap();
    assert_eq!(dto.name, "Bob");
    assert_eq!(dto.email, "bob@test.com");
}

#[test]
fn create_user_empty_email_fails() {
    let pool = init_test_db();
    let err = user_create(
        &pool,
        UserCreateReq {
            email: "   ".to_string(),
            name: "Carol".to_string(),
        },
    );
    assert_eq!(err.unwrap_err().code(), "VALIDATION_ERROR");
}

#[test]
fn create_user_empty_name_fails() {
    let pool = init_test_db();
    let err = user_create(
        &pool,
        UserCreateReq {
            email: "carol@test.com".to_string(),
            name: "".to_string(),
        },
    );
    assert_eq!(err.unwrap_err().code(), "VALIDATION_ERROR");
}

#[test]
fn create_user_duplicate_email_conflicts() {
    let pool = init_test_db();
    user_create(
        &pool,
        UserCreateReq {
            email: "a@x.com".to_string(),
            name: "A".to_string(),
        },
    )
    .unwrap();
    let err = user_create(
        &pool,
        UserCreateReq {
            email: "a@x.com".to_string(),
            name: "B".to_string(),
        },
    );
    assert_eq!(err.unwrap_err().code(), "CONFLICT");

    // the original row is unchanged and still the only one for that email
    let found = user_find_by_email(&pool, "a@x.com").unwrap().unwrap();
    assert_eq!(found.name, "A");
    let conn = pool.0.lock().unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM user WHERE email = ?1", ["a@x.com"], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 1);
}

// ══════════════════════════════════════════════════════════
//  user_find_by_email
// ══════════════════════════════════════════════════════════

#[test]
fn find_user_by_email_absent_returns_none() {
    let pool = init_test_db();
    assert!(user_find_by_email(&pool, "ghost@test.com").unwrap().is_none());
}

#[test]
fn find_user_by_email_returns_row() {
    let pool = init_test_db();
    let created = user_create(&pool, make_create_req("Dave")).unwrap();
    let found = user_find_by_email(&pool, "dave@test.com").unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert_eq!(found.name, "Dave");
}

#[test]
fn find_user_by_empty_email_fails() {
    let pool = init_test_db();
    let err = user_find_by_email(&pool, "  ");
    assert_eq!(err.unwrap_err().code(), "VALIDATION_ERROR");
}

#[test]
fn bootstrap_user_is_seeded() {
    let pool = init_test_db();
    let seed = user_find_by_email(&pool, DEFAULT_USER_EMAIL).unwrap().unwrap();
    assert_eq!(seed.name, DEFAULT_USER_NAME);
    assert!(seed.fish_ids.is_empty());
}

// ══════════════════════════════════════════════════════════
//  user_update_name
// ══════════════════════════════════════════════════════════

#[test]
fn update_user_name_changes_only_name() {
    let pool = init_test_db();
    let created = user_create(&pool, make_create_req("Eve")).unwrap();
    fish_create(&pool, make_fish_req(created.id, "First")).unwrap();

    let updated = user_update_name(&pool, created.id, "Eve Updated").unwrap();
    assert_eq!(updated.name, "Eve Updated");
    assert_eq!(updated.email, "eve@test.com");
    assert_eq!(updated.fish_ids.len(), 1);
}

#[test]
fn update_user_name_not_found_no_side_effect() {
    let pool = init_test_db();
    let err = user_update_name(&pool, 9999, "X");
    assert_eq!(err.unwrap_err().code(), "NOT_FOUND");

    let conn = pool.0.lock().unwrap();
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM user WHERE id = 9999", [], |r| r.get(0))
        .unwrap();
    assert_eq!(n, 0);
}

#[test]
fn update_user_name_empty_fails() {
    let pool = init_test_db();
    let created = user_create(&pool, make_create_req("Frank")).unwrap();
    let err = user_update_name(&pool, created.id, "   ");
    assert_eq!(err.unwrap_err().code(), "VALIDATION_ERROR");
    assert_eq!(user_get(&pool, created.id).unwrap().name, "Frank");
}

// ══════════════════════════════════════════════════════════
//  user_delete
// ══════════════════════════════════════════════════════════

#[test]
fn delete_user_cascades_owned_fish() {
    let pool = init_test_db();
    let owner = user_create(&pool, make_create_req("Grace")).unwrap();
    let f1 = fish_create(&pool, make_fish_req(owner.id, "One")).unwrap();
    let f2 = fish_create(&pool, make_fish_req(owner.id, "Two")).unwrap();

    user_delete(&pool, owner.id).unwrap();

    assert!(user_find_by_email(&pool, "grace@test.com").unwrap().is_none());
    assert!(fish_get(&pool, f1.id).unwrap().is_none());
    assert!(fish_get(&pool, f2.id).unwrap().is_none());
}

#[test]
fn delete_user_leaves_other_users_fish() {
    let pool = init_test_db();
    let a = user_create(&pool, make_create_req("Hank")).unwrap();
    let b = user_create(&pool, make_create_req("Ivy")).unwrap();
    let kept = fish_create(&pool, make_fish_req(b.id, "Keeper")).unwrap();
    fish_create(&pool, make_fish_req(a.id, "Gone")).unwrap();

    user_delete(&pool, a.id).unwrap();

    assert!(fish_get(&pool, kept.id).unwrap().is_some());
    assert_eq!(user_get(&pool, b.id).unwrap().fish_ids, vec![kept.id]);
}

#[test]
fn delete_user_not_found() {
    let pool = init_test_db();
    let err = user_delete(&pool, 9999);
    assert_eq!(err.unwrap_err().code(), "NOT_FOUND");
}
