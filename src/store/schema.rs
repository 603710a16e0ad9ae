/// Administrative database: principals and their role grants.
pub const ADMIN_SCHEMA: &str = r#"
-- Principals authenticate with an Argon2id-hashed secret
CREATE TABLE IF NOT EXISTS principals (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    secret_hash TEXT NOT NULL,      -- argon2id hash with embedded salt
    created_at TEXT DEFAULT (datetime('now'))
);

-- Role grants are always scoped to one database
CREATE TABLE IF NOT EXISTS principal_roles (
    principal_id TEXT NOT NULL REFERENCES principals(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    db TEXT NOT NULL,
    PRIMARY KEY (principal_id, role, db)
);

CREATE INDEX IF NOT EXISTS idx_principal_roles_principal ON principal_roles(principal_id);
"#;

/// Catalog of every logical database: collections with their validators and
/// the secondary indexes built on them. Document tables are created per
/// collection as `coll_<name>`.
pub const CATALOG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS _collections (
    name TEXT PRIMARY KEY,
    validator TEXT NOT NULL,        -- JSON validator contract
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS _indexes (
    collection TEXT NOT NULL REFERENCES _collections(name) ON DELETE CASCADE,
    name TEXT NOT NULL,
    keys TEXT NOT NULL,             -- JSON array of {field, order}
    is_unique INTEGER NOT NULL DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now')),
    PRIMARY KEY (collection, name)
);
"#;

pub fn collection_table(collection: &str) -> String {
    format!("\"coll_{collection}\"")
}

/// SQLite index object for a collection index. Collection names never contain
/// a hyphen, so the first one after the prefix ends the collection part.
pub fn index_object(collection: &str, index: &str) -> String {
    format!("\"{}{index}\"", index_object_prefix(collection))
}

/// Prefix of the SQLite index name reported in unique-constraint errors.
pub fn index_object_prefix(collection: &str) -> String {
    format!("ix_{collection}-")
}
