//! Device registry: models and schema for persistent storage.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows and conversions
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: `RegistryStore`, create / find / delete-by-filter per entity

pub mod models;
pub mod schema;
pub mod sqlite;

pub use models::{
    Counter, Device, FeederData, ModuleData, NewModule, RegisteredDevice, RegisteredModule,
    SESSION_TTL_SECS, Session, User, UserDevice, WaterData,
};
pub use schema::SQLITE_INIT;
pub use sqlite::{RegistryStore, SqlitePool};
