//! Fish catch use cases.

use crate::domain::fish_list;
use crate::error::AppError;
use crate::infra::get_connection;
use crate::infra::DbPool;
use chrono::Utc;
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInfo {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FishCreateReq {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub photo: String,
    pub location: LocationInfo,
    pub date: String,
    pub writer: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FishDto {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub date: String,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    pub photo: String,
    pub notes: String,
    pub writer: i64,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct FishCoordinateDto {
    pub latitude: f64,
    pub longitude: f64,
    pub photo: String,
}

const FISH_SELECT: &str = "SELECT id, name, type, date, latitude, longitude, location_name, photo, notes, writer, created_at FROM fish";

fn map_fish_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<FishDto> {
    Ok(FishDto {
        id: r.get(0)?,
        name: r.get(1)?,
        kind: r.get(2)?,
        date: r.get(3)?,
        latitude: r.get(4)?,
        longitude: r.get(5)?,
        location_name: r.get(6)?,
        photo: r.get(7)?,
        notes: r.get(8)?,
        writer: r.get(9)?,
        created_at: r.get(10)?,
    })
}

fn fish_by_id(conn: &Connection, fish_id: i64) -> Result<Option<FishDto>, AppError> {
    conn.query_row(
        &format!("{} WHERE id = ?1", FISH_SELECT),
        [fish_id],
        map_fish_row,
    )
    .optional()
    .map_err(|e| AppError::Db(e.to_string()))
}

/// Record a catch: insert the fish row, then append its id to the writer's
/// catch list. Both writes commit together or not at all; an unknown writer
/// aborts the transaction and leaves no fish row behind.
pub fn fish_create(pool: &DbPool, req: FishCreateReq) -> Result<FishDto, AppError> {
    if req.kind.trim().is_empty() {
        return Err(AppError::Validation("type is required".into()));
    }
    if req.photo.trim().is_empty() {
        return Err(AppError::Validation("photo is required".into()));
    }
    if req.date.trim().is_empty() {
        return Err(AppError::Validation("date is required".into()));
    }
    if req.writer <= 0 {
        return Err(AppError::Validation("writer is required".into()));
    }

    let now = Utc::now().to_rfc3339();
    let notes = req.notes.unwrap_or_default();

    let conn = get_connection(pool);
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| AppError::Db(e.to_string()))?;

    tx.execute(
        "INSERT INTO fish (name, type, date, latitude, longitude, location_name, photo, notes, writer, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            req.name,
            req.kind,
            req.date,
            req.location.latitude,
            req.location.longitude,
            req.location.name,
            req.photo,
            notes,
            req.writer,
            &now
        ],
    )
    .map_err(|e| AppError::Db(e.to_string()))?;
    let fish_id = tx.last_insert_rowid();

    let raw_list: String = tx
        .query_row(
            "SELECT fish_ids FROM user WHERE id = ?1",
            [req.writer],
            |r| r.get(0),
        )
        .map_err(|_| AppError::NotFound(format!("user {}", req.writer)))?;
    let updated = fish_list::append(&raw_list, fish_id)?;
    tx.execute(
        "UPDATE user SET fish_ids = ?1 WHERE id = ?2",
        params![updated, req.writer],
    )
    .map_err(|e| AppError::Db(e.to_string()))?;

    let dto = tx
        .query_row(
            &format!("{} WHERE id = ?1", FISH_SELECT),
            [fish_id],
            map_fish_row,
        )
        .map_err(|e| AppError::Db(e.to_string()))?;

    tx.commit().map_err(|e| AppError::Db(e.to_string()))?;
    Ok(dto)
}

pub fn fish_get(pool: &DbPool, fish_id: i64) -> Result<Option<FishDto>, AppError> {
    let conn = get_connection(pool);
    fish_by_id(&conn, fish_id)
}

/// Resolve a user's catch list to full rows, preserving list order. A list
/// entry that no longer resolves is logged and skipped so the browsing
/// screens keep working even when the list and the table disagree.
pub fn fish_for_user(pool: &DbPool, user_id: i64) -> Result<Vec<FishDto>, AppError> {
    let conn = get_connection(pool);
    let raw_list: String = conn
        .query_row("SELECT fish_ids FROM user WHERE id = ?1", [user_id], |r| {
            r.get(0)
        })
        .map_err(|_| AppError::NotFound(format!("user {}", user_id)))?;
    let ids = fish_list::decode(&raw_list)?;

    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        match fish_by_id(&conn, id)? {
            Some(dto) => out.push(dto),
            None => warn!(
                "catch list of user {} references missing fish {}, skipping",
                user_id, id
            ),
        }
    }
    Ok(out)
}

/// Calendar lookup: the user's catches whose date string equals `date`.
/// Dates are compared lexically, `YYYY-MM-DD` by caller convention.
pub fn fish_for_user_on_date(
    pool: &DbPool,
    user_id: i64,
    date: &str,
) -> Result<Vec<FishDto>, AppError> {
    let mut all = fish_for_user(pool, user_id)?;
    all.retain(|f| f.date == date);
    Ok(all)
}

/// Delete a catch and drop its id from the owner's catch list, as one atomic
/// unit. The row's writer must match `owner_id`; a mismatch fails before
/// anything is mutated.
pub fn fish_delete(pool: &DbPool, fish_id: i64, owner_id: i64) -> Result<(), AppError> {
    let conn = get_connection(pool);
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| AppError::Db(e.to_string()))?;

    let writer: Option<i64> = tx
        .query_row("SELECT writer FROM fish WHERE id = ?1", [fish_id], |r| {
            r.get(0)
        })
        .optional()
        .map_err(|e| AppError::Db(e.to_string()))?;
    match writer {
        None => return Err(AppError::NotFound(format!("fish {}", fish_id))),
        Some(w) if w != owner_id => {
            return Err(AppError::NotFound(format!(
                "fish {} for user {}",
                fish_id, owner_id
            )))
        }
        Some(_) => {}
    }

    tx.execute("DELETE FROM fish WHERE id = ?1", [fish_id])
        .map_err(|e| AppError::Db(e.to_string()))?;

    let raw_list: String = tx
        .query_row("SELECT fish_ids FROM user WHERE id = ?1", [owner_id], |r| {
            r.get(0)
        })
        .map_err(|_| AppError::NotFound(format!("user {}", owner_id)))?;
    let updated = fish_list::remove(&raw_list, fish_id)?;
    tx.execute(
        "UPDATE user SET fish_ids = ?1 WHERE id = ?2",
        params![updated, owner_id],
    )
    .map_err(|e| AppError::Db(e.to_string()))?;

    tx.commit().map_err(|e| AppError::Db(e.to_string()))?;
    Ok(())
}

/// Denormalized read for the map screen: every catch's pin and photo, no
/// ownership filter.
pub fn fish_all_coordinates(pool: &DbPool) -> Result<Vec<FishCoordinateDto>, AppError> {
    let conn = get_connection(pool);
    let mut stmt = conn
        .prepare("SELECT latitude, longitude, photo FROM fish")
        .map_err(|e| AppError::Db(e.to_string()))?;
    let rows = stmt.query_map([], |r| {
        Ok(FishCoordinateDto {
            latitude: r.get(0)?,
            longitude: r.get(1)?,
            photo: r.get(2)?,
        })
    })?;
    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| AppError::Db(e.to_string()))?);
    }
    Ok(out)
}
