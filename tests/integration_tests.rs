//! Integration tests for the estate-crm binary.
//!
//! Each test runs in its own temporary directory so database files and
//! config lookups never touch the repository.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create an estate-crm Command isolated from the caller's environment.
fn crm(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("estate-crm");
    cmd.current_dir(dir.path());
    for var in [
        "ESTATE_CRM_CONFIG",
        "ESTATE_CRM_HOST",
        "ESTATE_CRM_PORT",
        "ESTATE_CRM_DB_PATH",
        "ESTATE_CRM_OVERDUE_DAYS",
        "ESTATE_CRM_LOG_FORMAT",
        "ESTATE_CRM_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// =============================================================================
// Basic CLI Tests
// =============================================================================

mod cli_basics {
    use super::*;

    #[test]
    fn test_help_lists_commands() {
        let dir = temp_dir();
        crm(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("serve"))
            .stdout(predicate::str::contains("init-db"))
            .stdout(predicate::str::contains("seed"));
    }

    #[test]
    fn test_version() {
        let dir = temp_dir();
        crm(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("estate-crm"));
    }

    #[test]
    fn test_unknown_command_fails() {
        let dir = temp_dir();
        crm(&dir).arg("launch").assert().failure();
    }
}

// =============================================================================
// Database Commands
// =============================================================================

mod database {
    use super::*;

    #[test]
    fn test_init_db_creates_file() {
        let dir = temp_dir();
        crm(&dir)
            .args(["init-db", "--db-path", "nested/crm.db"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Database initialized"));
        assert!(dir.path().join("nested/crm.db").exists());
    }

    #[test]
    fn test_init_db_is_idempotent() {
        let dir = temp_dir();
        crm(&dir).args(["init-db", "--db-path", "crm.db"]).assert().success();
        crm(&dir).args(["init-db", "--db-path", "crm.db"]).assert().success();
    }

    #[test]
    fn test_init_db_uses_env_path() {
        let dir = temp_dir();
        crm(&dir)
            .arg("init-db")
            .env("ESTATE_CRM_DB_PATH", "from-env.db")
            .assert()
            .success();
        assert!(dir.path().join("from-env.db").exists());
    }

    #[test]
    fn test_seed_loads_sample_data() {
        let dir = temp_dir();
        crm(&dir)
            .args(["seed", "--db-path", "crm.db"])
            .assert()
            .success()
            .stdout(predicate::str::contains("2 customers"))
            .stdout(predicate::str::contains("4 categories"));
    }

    #[test]
    fn test_second_seed_is_refused() {
        let dir = temp_dir();
        crm(&dir).args(["seed", "--db-path", "crm.db"]).assert().success();
        crm(&dir)
            .args(["seed", "--db-path", "crm.db"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already contains customers"));
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod config {
    use super::*;

    #[test]
    fn test_config_show_defaults() {
        let dir = temp_dir();
        crm(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("using defaults"))
            .stdout(predicate::str::contains("port = 5000"))
            .stdout(predicate::str::contains("overdue_days = 20"));
    }

    #[test]
    fn test_config_show_reads_local_file() {
        let dir = temp_dir();
        fs::write(
            dir.path().join("estate-crm.toml"),
            "[server]\nport = 8088\n\n[interactions]\noverdue_days = 9\n",
        )
        .unwrap();
        crm(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Config file: estate-crm.toml"))
            .stdout(predicate::str::contains("port = 8088"))
            .stdout(predicate::str::contains("overdue_days = 9"));
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = temp_dir();
        fs::write(dir.path().join("estate-crm.toml"), "[server]\nport = 8088\n").unwrap();
        crm(&dir)
            .args(["config", "show"])
            .env("ESTATE_CRM_PORT", "9099")
            .assert()
            .success()
            .stdout(predicate::str::contains("port = 9099"));
    }

    #[test]
    fn test_explicit_config_flag() {
        let dir = temp_dir();
        fs::write(dir.path().join("custom.toml"), "[logging]\nformat = \"json\"\n").unwrap();
        crm(&dir)
            .args(["--config", "custom.toml", "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("format = \"json\""));
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = temp_dir();
        crm(&dir)
            .args(["--config", "nope.toml", "config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to read config file"));
    }

    #[test]
    fn test_config_validate() {
        let dir = temp_dir();
        crm(&dir)
            .args(["config", "validate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Configuration is valid"));

        fs::write(dir.path().join("estate-crm.toml"), "[interactions]\noverdue_days = 0\n").unwrap();
        crm(&dir)
            .args(["config", "validate"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("overdue_days"));
    }

    #[test]
    fn test_serve_rejects_invalid_config() {
        let dir = temp_dir();
        crm(&dir)
            .args(["serve", "--port", "0"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("server.port"));
    }
}
