//! SQLite schema definition.

/// Schema for the device key-value store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Key-Value Store (one row per collection)
-- ============================================================================

CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,                         -- JSON document
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;
