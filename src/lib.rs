//! # personadb
//!
//! One-shot bootstrap for the persona document database, usable both as a
//! standalone binary and as a library.
//!
//! The bootstrap provisions an application principal, drops and recreates
//! the `persona`, `profesion`, `telefono` and `estudios` collections with
//! their validators, builds the relational indexes and loads a sample data
//! set. Schema reset destroys existing data in those collections.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! personadb = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use personadb::setup::{DATABASE, PrincipalSpec, SetupPlan, run_setup};
//! use personadb::store::SqliteStore;
//!
//! let store = SqliteStore::new("./data").unwrap();
//! let plan = SetupPlan {
//!     principal: PrincipalSpec {
//!         name: "persona_db".to_string(),
//!         secret: std::env::var("PERSONADB_APP_PASSWORD").unwrap(),
//!         database: DATABASE.to_string(),
//!         grant_db_admin: false,
//!     },
//!     database: DATABASE.to_string(),
//!     seed: true,
//! };
//! let report = run_setup(&store, &plan).unwrap();
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

pub mod auth;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod setup;
pub mod store;
pub mod types;
pub mod validator;
