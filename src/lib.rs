//! Embedded catch-log storage: the SQLite schema and typed CRUD layer the
//! screens and auth layer call into.

pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
