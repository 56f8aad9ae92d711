//! SQL DDL for initializing the registry storage.
//! SQLite-first design; embedded and free-form fields are JSON text columns.

/// SQLite schema with:
/// - one table per persisted entity, `id INTEGER PRIMARY KEY AUTOINCREMENT`
/// - `users.devices` holding the embedded device list as a JSON array
/// - `registered_devices.status` and `registered_modules.data` as JSON objects
/// - no UNIQUE constraints (serials may repeat)
/// - `sessions.created_at` as unix milliseconds, indexed for the expiry sweep
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NULL,
    pw TEXT NULL,
    devices TEXT NOT NULL DEFAULT '[]' -- JSON array of {type, serial}
);

CREATE TABLE IF NOT EXISTS devices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NULL
);

CREATE TABLE IF NOT EXISTS registered_devices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    type TEXT NULL,
    serial TEXT NULL,
    status TEXT NOT NULL DEFAULT '{}' -- JSON object, caller-defined shape
);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    sid TEXT NULL,
    email TEXT NULL,
    created_at INTEGER NOT NULL -- unix milliseconds
);

CREATE INDEX IF NOT EXISTS idx_sessions_created_at ON sessions(created_at);

CREATE TABLE IF NOT EXISTS counters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NULL,
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE TABLE IF NOT EXISTS registered_modules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    serial TEXT NOT NULL,
    type_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    data TEXT NOT NULL, -- JSON object, shape keyed by type_id
    reservation TEXT NULL -- RFC3339
)
"#;
