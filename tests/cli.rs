//! CLI integration tests for the personadb commands.
//!
//! Each test uses an isolated temp directory for the database files, ensuring
//! tests can run in parallel safely.

#![allow(deprecated)] // Command::cargo_bin deprecation only affects custom build dirs

use std::path::Path;

use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use personadb::store::{SqliteStore, Store};
use predicates::prelude::*;
use serde_json::Value;

const PASSWORD: &str = "test-secret";

struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    fn data_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    fn data_dir_str(&self) -> String {
        self.data_dir().to_string_lossy().to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("personadb").expect("failed to find binary");
        cmd.env("NO_COLOR", "1")
            .env_remove("PERSONADB_DATA_DIR")
            .env("PERSONADB_APP_PASSWORD", PASSWORD)
            .current_dir(self.data_dir());
        cmd
    }

    fn run(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        let data_dir = self.data_dir_str();
        let mut full = args.to_vec();
        full.extend(["--data-dir", data_dir.as_str()]);
        self.cmd().args(&full).assert()
    }

    fn setup(&self) -> assert_cmd::assert::Assert {
        self.run(&["setup", "--non-interactive", "--yes"])
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.run(args).success().get_output().stdout.clone();
        serde_json::from_slice(&output).expect("failed to parse JSON")
    }
}

#[test]
fn test_setup_requires_yes_when_non_interactive() {
    let ctx = TestContext::new();

    ctx.run(&["setup", "--non-interactive"])
        .failure()
        .stderr(predicate::str::contains("--yes is required"));

    assert!(!ctx.data_dir().join("persona_db.db").exists());
}

#[test]
fn test_setup_creates_everything() {
    let ctx = TestContext::new();

    ctx.setup()
        .success()
        .stdout(predicate::str::contains("Persona Database Setup"))
        .stdout(predicate::str::contains("estudios.ccPer_1_idProf_1 unique"))
        .stdout(predicate::str::contains("Total: 14 inserted, 0 rejected"));

    ctx.temp_dir.child("admin.db").assert(predicate::path::exists());
    ctx.temp_dir.child("persona_db.db").assert(predicate::path::exists());

    let info = ctx.json(&["info", "--json"]);
    assert_eq!(info["database_exists"], true);
    assert_eq!(info["principal"]["exists"], true);
    assert_eq!(info["principal"]["roles"][0], "readWrite@persona_db");

    let collections = info["collections"].as_array().unwrap();
    let counts: Vec<(&str, u64)> = collections
        .iter()
        .map(|c| (c["name"].as_str().unwrap(), c["documents"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        counts,
        vec![("persona", 8), ("profesion", 2), ("telefono", 2), ("estudios", 2)]
    );
    assert_eq!(collections[2]["indexes"], serde_json::json!(["_id_", "duenio_1"]));
    assert_eq!(collections[3]["indexes"].as_array().unwrap().len(), 4);
}

#[test]
fn test_setup_json_report() {
    let ctx = TestContext::new();

    let report = ctx.json(&["setup", "--non-interactive", "--yes", "--json"]);
    assert_eq!(report["principal"]["status"], "created");
    assert_eq!(report["database"], "persona_db");
    assert_eq!(report["indexes"].as_array().unwrap().len(), 4);
    assert_eq!(report["indexes"][3]["index"], "ccPer_1_idProf_1");
    assert_eq!(report["indexes"][3]["created"], true);
    assert_eq!(report["seed"]["collections"][0]["inserted"], 8);
    assert!(report.get("generated_password").is_none());
}

#[test]
fn test_setup_skip_seed() {
    let ctx = TestContext::new();

    let report = ctx.json(&["setup", "--non-interactive", "--yes", "--skip-seed", "--json"]);
    assert!(report["seed"].is_null());

    let info = ctx.json(&["info", "--json"]);
    assert!(info["collections"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["documents"] == 0));
}

#[test]
fn test_setup_twice_keeps_principal() {
    let ctx = TestContext::new();
    ctx.setup().success();

    let report = ctx.json(&["setup", "--non-interactive", "--yes", "--json"]);
    assert_eq!(report["principal"]["status"], "already_exists");
    assert!(report["collections"]
        .as_array()
        .unwrap()
        .iter()
        .all(|c| c["dropped"] == true));
    assert_eq!(report["seed"]["collections"][0]["inserted"], 8);
}

#[test]
fn test_setup_generates_password_when_unset() {
    let ctx = TestContext::new();

    let output = ctx
        .cmd()
        .env_remove("PERSONADB_APP_PASSWORD")
        .args([
            "setup",
            "--data-dir",
            &ctx.data_dir_str(),
            "--non-interactive",
            "--yes",
            "--json",
        ])
        .output()
        .expect("failed to run command");
    assert!(output.status.success());

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    let password = report["generated_password"].as_str().unwrap();
    assert_eq!(password.len(), 32);

    let store = SqliteStore::new(ctx.data_dir()).unwrap();
    assert!(store.authenticate("persona_db", password).unwrap().is_some());
}

#[test]
fn test_seed_rerun_reports_duplicates() {
    let ctx = TestContext::new();
    ctx.setup().success();

    let report = ctx.json(&["seed", "--json"]);
    let rejected: usize = report["collections"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["failures"].as_array().unwrap().len())
        .sum();
    assert_eq!(rejected, 14);
    assert_eq!(report["collections"][0]["failures"][0]["kind"], "duplicate_key");
}

#[test]
fn test_seed_requires_setup() {
    let ctx = TestContext::new();

    ctx.run(&["seed"])
        .failure()
        .stderr(predicate::str::contains("Run 'personadb setup' first"));
}

#[test]
fn test_catalog_upsert() {
    let ctx = TestContext::new();
    ctx.setup().success();

    let first = ctx.json(&["catalog", "--json"]);
    assert_eq!(first["inserted"], 3);
    assert_eq!(first["replaced"], 2);
    assert_eq!(first["total"], 5);

    let second = ctx.json(&["catalog", "--json"]);
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["replaced"], 5);
}

#[test]
fn test_verify() {
    let ctx = TestContext::new();
    ctx.setup().success();

    ctx.run(&["verify", "--non-interactive"])
        .success()
        .stdout(predicate::str::contains("Authenticated as 'persona_db'"))
        .stdout(predicate::str::contains("find, insert, update, remove"));

    ctx.cmd()
        .env("PERSONADB_APP_PASSWORD", "wrong")
        .args(["verify", "--non-interactive", "--data-dir", &ctx.data_dir_str()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn test_config_file() {
    let ctx = TestContext::new();
    let config = ctx.temp_dir.child("personadb.toml");
    config
        .write_str("app_user = \"persona_app\"\ngrant_db_admin = true\n")
        .unwrap();
    let config_path = config.path().to_string_lossy().to_string();

    ctx.run(&["setup", "--non-interactive", "--yes", "--config", &config_path])
        .success();

    let info = ctx.json(&["info", "--json", "--config", &config_path]);
    assert_eq!(info["principal"]["name"], "persona_app");
    assert_eq!(info["principal"]["roles"].as_array().unwrap().len(), 2);
}

#[test]
fn test_info_before_setup() {
    let ctx = TestContext::new();

    let info = ctx.json(&["info", "--json"]);
    assert_eq!(info["database_exists"], false);
    assert_eq!(info["principal"]["exists"], false);
    assert!(info["collections"].as_array().unwrap().is_empty());
}
