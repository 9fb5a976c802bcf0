//! Codec for the denormalized per-user catch list (`user.fish_ids`).
//!
//! The column holds a JSON array of fish row IDs in insertion order. It is a
//! maintained index over `fish.writer`: every mutation of the `fish` table
//! rewrites the owner's list in the same transaction, through `append` and
//! `remove`, so the list never carries duplicates.

use crate::error::AppError;

/// Decode the stored column value. Blank input counts as an empty list.
pub fn decode(raw: &str) -> Result<Vec<i64>, AppError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(|e| AppError::Db(format!("malformed catch list: {}", e)))
}

pub fn encode(ids: &[i64]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

/// Append `id`, keeping the list duplicate-free.
pub fn append(raw: &str, id: i64) -> Result<String, AppError> {
    let mut ids = decode(raw)?;
    if !ids.contains(&id) {
        ids.push(id);
    }
    Ok(encode(&ids))
}

/// Remove `id` if present; removing an absent id is a no-op.
pub fn remove(raw: &str, id: i64) -> Result<String, AppError> {
    let mut ids = decode(raw)?;
    ids.retain(|v| *v != id);
    Ok(encode(&ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_blank_is_empty() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("  ").unwrap().is_empty());
        assert!(decode("[]").unwrap().is_empty());
    }

    #[test]
    fn decode_malformed_fails() {
        assert!(decode("not json").is_err());
        assert!(decode("{\"a\":1}").is_err());
    }

    #[test]
    fn append_keeps_order() {
        let raw = append("[]", 3).unwrap();
        let raw = append(&raw, 1).unwrap();
        let raw = append(&raw, 2).unwrap();
        assert_eq!(decode(&raw).unwrap(), vec![3, 1, 2]);
    }

    #[test]
    fn append_is_duplicate_free() {
        let raw = append("[1,2]", 2).unwrap();
        assert_eq!(decode(&raw).unwrap(), vec![1, 2]);
    }

    #[test]
    fn remove_present_and_absent() {
        let raw = remove("[1,2,3]", 2).unwrap();
        assert_eq!(decode(&raw).unwrap(), vec![1, 3]);
        let raw = remove(&raw, 99).unwrap();
        assert_eq!(decode(&raw).unwrap(), vec![1, 3]);
    }
}
