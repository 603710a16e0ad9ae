use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::index::{IDENTITY_INDEX, IndexKey, IndexModel, SortOrder};
use super::name::{validate_collection_name, validate_database_name, validate_principal_name};
use super::schema::{
    ADMIN_SCHEMA, CATALOG_SCHEMA, collection_table, index_object, index_object_prefix,
};
use super::{
    Database, IndexOutcome, InsertManyOptions, InsertManyResult, Store, UpsertOutcome, WriteFailure,
};
use crate::auth::SecretHasher;
use crate::error::{Error, Result};
use crate::types::document::{ID_FIELD, display_id, document_label, id_key};
use crate::types::*;
use crate::validator::JsonSchema;

pub const DEFAULT_ADMIN_DATABASE: &str = "admin";

/// A document store kept as one SQLite file per logical database under a
/// data directory. Principals live in the administrative database file.
pub struct SqliteStore {
    data_dir: PathBuf,
    admin_database: String,
    conn: Mutex<Connection>,
    hasher: SecretHasher,
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;

    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(conn)
}

fn database_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.db"))
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|e| e.into_inner())
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        Self::with_admin_database(data_dir, DEFAULT_ADMIN_DATABASE)
    }

    pub fn with_admin_database<P: AsRef<Path>>(data_dir: P, admin_database: &str) -> Result<Self> {
        validate_database_name(admin_database)?;

        let data_dir = data_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_dir)?;
        let conn = open_connection(&database_path(&data_dir, admin_database))?;

        Ok(Self {
            data_dir,
            admin_database: admin_database.to_string(),
            conn: Mutex::new(conn),
            hasher: SecretHasher::new(),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        lock(&self.conn)
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    #[must_use]
    pub fn admin_database(&self) -> &str {
        &self.admin_database
    }

    /// Whether a logical database has been created under the data directory.
    #[must_use]
    pub fn database_exists(&self, name: &str) -> bool {
        validate_database_name(name).is_ok() && database_path(&self.data_dir, name).exists()
    }

    fn principal_with_hash(&self, name: &str) -> Result<Option<(Principal, String)>> {
        let conn = self.conn();
        let row = conn
            .query_row(
                "SELECT id, name, secret_hash, created_at FROM principals WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, name, secret_hash, created_at)) = row else {
            return Ok(None);
        };

        let roles = load_roles(&conn, &id)?;
        let principal = Principal {
            id,
            name,
            roles,
            created_at: parse_datetime(&created_at),
        };
        Ok(Some((principal, secret_hash)))
    }
}

fn load_roles(conn: &Connection, principal_id: &str) -> Result<Vec<RoleGrant>> {
    let mut stmt = conn.prepare(
        "SELECT role, db FROM principal_roles WHERE principal_id = ?1 ORDER BY db, role",
    )?;

    let rows = stmt.query_map(params![principal_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut grants = Vec::new();
    for row in rows {
        let (role, db) = row?;
        let role = Role::parse(&role)
            .ok_or_else(|| Error::Config(format!("unknown role '{role}' in admin database")))?;
        grants.push(RoleGrant { role, db });
    }
    Ok(grants)
}

impl Store for SqliteStore {
    type Database = SqliteDatabase;

    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(ADMIN_SCHEMA)?;
        Ok(())
    }

    fn database(&self, name: &str) -> Result<SqliteDatabase> {
        validate_database_name(name)?;
        if name == self.admin_database {
            return Err(Error::InvalidName(format!(
                "'{name}' is the administrative database"
            )));
        }
        SqliteDatabase::open(&database_path(&self.data_dir, name), name)
    }

    // Principal operations

    fn create_principal(&self, principal: &NewPrincipal) -> Result<Principal> {
        validate_principal_name(&principal.name)?;
        if principal.secret.is_empty() {
            return Err(Error::Config("principal secret cannot be empty".to_string()));
        }
        for grant in &principal.roles {
            validate_database_name(&grant.db)?;
        }

        let secret_hash = self.hasher.hash(&principal.secret)?;
        let created = Principal {
            id: Uuid::new_v4().to_string(),
            name: principal.name.clone(),
            roles: principal.roles.clone(),
            created_at: Utc::now(),
        };

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let result = tx.execute(
            "INSERT INTO principals (id, name, secret_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                created.id,
                created.name,
                secret_hash,
                format_datetime(&created.created_at),
            ],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::AlreadyExists);
            }
            Err(e) => return Err(Error::from(e)),
        }

        for grant in &created.roles {
            tx.execute(
                "INSERT OR IGNORE INTO principal_roles (principal_id, role, db) VALUES (?1, ?2, ?3)",
                params![created.id, grant.role.as_str(), grant.db],
            )?;
        }

        tx.commit()?;
        Ok(created)
    }

    fn get_principal(&self, name: &str) -> Result<Option<Principal>> {
        Ok(self
            .principal_with_hash(name)?
            .map(|(principal, _)| principal))
    }

    fn authenticate(&self, name: &str, secret: &str) -> Result<Option<Principal>> {
        let Some((principal, secret_hash)) = self.principal_with_hash(name)? else {
            return Ok(None);
        };

        if self.hasher.verify(secret, &secret_hash)? {
            Ok(Some(principal))
        } else {
            Ok(None)
        }
    }
}

/// Handle to one logical database file.
pub struct SqliteDatabase {
    name: String,
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    fn open(path: &Path, name: &str) -> Result<Self> {
        let conn = open_connection(path)?;
        conn.execute_batch(CATALOG_SCHEMA)?;

        Ok(Self {
            name: name.to_string(),
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        lock(&self.conn)
    }
}

fn load_validator(conn: &Connection, collection: &str) -> Result<Option<JsonSchema>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT validator FROM _collections WHERE name = ?1",
            params![collection],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|s| serde_json::from_str(&s).map_err(Error::from))
        .transpose()
}

fn require_validator(conn: &Connection, collection: &str) -> Result<JsonSchema> {
    load_validator(conn, collection)?
        .ok_or_else(|| Error::CollectionNotFound(collection.to_string()))
}

fn collection_exists(conn: &Connection, collection: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM _collections WHERE name = ?1)",
        params![collection],
        |row| row.get(0),
    )
    .map_err(Error::from)
}

fn key_expressions(index: &IndexModel) -> String {
    index
        .keys
        .iter()
        .map(|key| {
            let order = match key.order {
                SortOrder::Ascending => "",
                SortOrder::Descending => " DESC",
            };
            format!("json_extract(doc, '$.{}'){order}", key.field)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Maps a uniqueness violation to the name of the index that raised it.
fn duplicate_index(err: &rusqlite::Error, collection: &str) -> Option<String> {
    match err {
        rusqlite::Error::SqliteFailure(e, msg)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            let prefix = index_object_prefix(collection);
            let index = msg
                .as_deref()
                .and_then(|m| m.split('\'').nth(1))
                .and_then(|object| object.strip_prefix(&prefix))
                .unwrap_or(IDENTITY_INDEX);
            Some(index.to_string())
        }
        _ => None,
    }
}

fn map_write_error(err: rusqlite::Error, collection: &str, id: &Value) -> Error {
    match duplicate_index(&err, collection) {
        Some(index) => Error::DuplicateKey {
            collection: collection.to_string(),
            index,
            id: display_id(id),
        },
        None => Error::from(err),
    }
}

/// Documents without `_id` get a generated UUID string.
fn with_id(doc: &Document) -> Cow<'_, Document> {
    if doc.contains_key(ID_FIELD) {
        Cow::Borrowed(doc)
    } else {
        let mut owned = doc.clone();
        owned.insert(
            ID_FIELD.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );
        Cow::Owned(owned)
    }
}

fn check_document(validator: &JsonSchema, doc: &Document) -> Result<()> {
    let violations = validator.violations(doc);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation {
            id: document_label(doc),
            violations,
        })
    }
}

fn insert_one(
    conn: &Connection,
    sql: &str,
    collection: &str,
    validator: &JsonSchema,
    doc: &Document,
) -> Result<Value> {
    let doc = with_id(doc);
    let id = doc[ID_FIELD].clone();

    check_document(validator, &doc)?;

    let body = serde_json::to_string(doc.as_ref())?;
    conn.execute(sql, params![id_key(&id), body])
        .map_err(|e| map_write_error(e, collection, &id))?;
    Ok(id)
}

impl Database for SqliteDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    // Collection operations

    fn create_collection(&self, name: &str, validator: &JsonSchema) -> Result<()> {
        validate_collection_name(name)?;
        validator.check()?;

        let mut conn = self.conn();
        if collection_exists(&conn, name)? {
            return Err(Error::AlreadyExists);
        }

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO _collections (name, validator) VALUES (?1, ?2)",
            params![name, serde_json::to_string(validator)?],
        )?;
        tx.execute_batch(&format!(
            "CREATE TABLE {} (id TEXT PRIMARY KEY, doc TEXT NOT NULL)",
            collection_table(name)
        ))?;
        tx.commit()?;

        debug!(database = %self.name, collection = name, "collection created");
        Ok(())
    }

    fn drop_collection(&self, name: &str) -> Result<bool> {
        validate_collection_name(name)?;

        let mut conn = self.conn();
        if !collection_exists(&conn, name)? {
            return Ok(false);
        }

        let tx = conn.transaction()?;
        tx.execute_batch(&format!("DROP TABLE IF EXISTS {}", collection_table(name)))?;
        tx.execute("DELETE FROM _indexes WHERE collection = ?1", params![name])?;
        tx.execute("DELETE FROM _collections WHERE name = ?1", params![name])?;
        tx.commit()?;

        debug!(database = %self.name, collection = name, "collection dropped");
        Ok(true)
    }

    fn list_collections(&self) -> Result<Vec<String>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT name FROM _collections ORDER BY name")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn collection_validator(&self, name: &str) -> Result<Option<JsonSchema>> {
        load_validator(&self.conn(), name)
    }

    // Index operations

    fn create_index(&self, collection: &str, index: &IndexModel) -> Result<IndexOutcome> {
        index.check()?;

        let mut conn = self.conn();
        if !collection_exists(&conn, collection)? {
            return Err(Error::CollectionNotFound(collection.to_string()));
        }

        let conflict = || Error::IndexConflict {
            collection: collection.to_string(),
            name: index.name.clone(),
        };

        if index.is_identity() {
            return if *index == IndexModel::identity() {
                Ok(IndexOutcome::AlreadyExists)
            } else {
                Err(conflict())
            };
        }

        let existing: Option<(String, bool)> = conn
            .query_row(
                "SELECT keys, is_unique FROM _indexes WHERE collection = ?1 AND name = ?2",
                params![collection, index.name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        if let Some((keys, unique)) = existing {
            let keys: Vec<IndexKey> = serde_json::from_str(&keys)?;
            if keys == index.keys && unique == index.unique {
                debug!(collection, index = %index.name, "index already exists");
                return Ok(IndexOutcome::AlreadyExists);
            }
            return Err(conflict());
        }

        let tx = conn.transaction()?;
        let unique = if index.unique { "UNIQUE " } else { "" };
        let sql = format!(
            "CREATE {unique}INDEX {} ON {} ({})",
            index_object(collection, &index.name),
            collection_table(collection),
            key_expressions(index)
        );

        if let Err(e) = tx.execute_batch(&sql) {
            if duplicate_index(&e, collection).is_some() {
                return Err(Error::IndexViolation {
                    collection: collection.to_string(),
                    index: index.name.clone(),
                });
            }
            return Err(e.into());
        }

        tx.execute(
            "INSERT INTO _indexes (collection, name, keys, is_unique) VALUES (?1, ?2, ?3, ?4)",
            params![
                collection,
                index.name,
                serde_json::to_string(&index.keys)?,
                index.unique
            ],
        )?;
        tx.commit()?;

        debug!(collection, index = %index.name, unique = index.unique, "index created");
        Ok(IndexOutcome::Created)
    }

    fn list_indexes(&self, collection: &str) -> Result<Vec<IndexModel>> {
        let conn = self.conn();
        if !collection_exists(&conn, collection)? {
            return Err(Error::CollectionNotFound(collection.to_string()));
        }

        let mut stmt = conn.prepare(
            "SELECT name, keys, is_unique FROM _indexes WHERE collection = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![collection], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })?;

        let mut indexes = vec![IndexModel::identity()];
        for row in rows {
            let (name, keys, unique) = row?;
            indexes.push(IndexModel {
                name,
                keys: serde_json::from_str(&keys)?,
                unique,
            });
        }
        Ok(indexes)
    }

    // Document operations

    fn insert_many(
        &self,
        collection: &str,
        docs: &[Document],
        options: InsertManyOptions,
    ) -> Result<InsertManyResult> {
        let mut conn = self.conn();
        let validator = require_validator(&conn, collection)?;
        let sql = format!(
            "INSERT INTO {} (id, doc) VALUES (?1, ?2)",
            collection_table(collection)
        );

        let tx = conn.transaction()?;
        let mut result = InsertManyResult::default();

        for (index, doc) in docs.iter().enumerate() {
            match insert_one(&tx, &sql, collection, &validator, doc) {
                Ok(id) => result.inserted_ids.push(id),
                Err(error) if error.is_document_error() => {
                    debug!(collection, index, %error, "document rejected");
                    result.failures.push(WriteFailure { index, error });
                    if options.ordered {
                        break;
                    }
                }
                Err(error) => return Err(error),
            }
        }

        tx.commit()?;
        Ok(result)
    }

    fn upsert_by_id(&self, collection: &str, doc: &Document) -> Result<UpsertOutcome> {
        let mut conn = self.conn();
        let validator = require_validator(&conn, collection)?;

        let id = doc.get(ID_FIELD).cloned().ok_or_else(|| Error::Validation {
            id: document_label(doc),
            violations: vec![format!("missing required field '{ID_FIELD}'")],
        })?;
        check_document(&validator, doc)?;

        let table = collection_table(collection);
        let key = id_key(&id);
        let body = serde_json::to_string(doc)?;

        let tx = conn.transaction()?;
        let exists: bool = tx.query_row(
            &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
            params![key],
            |row| row.get(0),
        )?;

        let outcome = if exists {
            tx.execute(
                &format!("UPDATE {table} SET doc = ?2 WHERE id = ?1"),
                params![key, body],
            )
            .map_err(|e| map_write_error(e, collection, &id))?;
            UpsertOutcome::Replaced
        } else {
            tx.execute(
                &format!("INSERT INTO {table} (id, doc) VALUES (?1, ?2)"),
                params![key, body],
            )
            .map_err(|e| map_write_error(e, collection, &id))?;
            UpsertOutcome::Inserted
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn find_by_id(&self, collection: &str, id: &Value) -> Result<Option<Document>> {
        let conn = self.conn();
        if !collection_exists(&conn, collection)? {
            return Err(Error::CollectionNotFound(collection.to_string()));
        }

        let raw: Option<String> = conn
            .query_row(
                &format!(
                    "SELECT doc FROM {} WHERE id = ?1",
                    collection_table(collection)
                ),
                params![id_key(id)],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|s| serde_json::from_str(&s).map_err(Error::from))
            .transpose()
    }

    fn count_documents(&self, collection: &str) -> Result<u64> {
        let conn = self.conn();
        if !collection_exists(&conn, collection)? {
            return Err(Error::CollectionNotFound(collection.to_string()));
        }

        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", collection_table(collection)),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}
