//! End-to-end tests for the packman CLI
//!
//! These tests verify:
//! - Help, version and argument validation
//! - Exit codes for usage errors, problems and clean runs
//! - JSON output schema
//! - Commands that need no registry access leave or edit files as expected
//!
//! Every project used here has no registry lookups to make, so the tests
//! run offline.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn packman() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_packman"));
    cmd.env_remove("RUST_LOG")
        .env_remove("PACKMAN_CONCURRENCY")
        // unreachable on purpose: nothing below may hit the network
        .env("PACKMAN_REGISTRY_URL", "http://127.0.0.1:9");
    cmd
}

/// Project without dependencies: analysis needs no registry lookups
fn create_bare_project(engines: &str) -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let manifest = format!(
        "{{\n  \"name\": \"bare\",\n  \"version\": \"1.0.0\",\n  \"engines\": {{\n    \"node\": \"{}\"\n  }}\n}}\n",
        engines
    );
    fs::write(temp_dir.path().join("package.json"), manifest).unwrap();
    temp_dir
}

/// Project with installed dependencies recorded in the lockfile
fn create_locked_project() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    fs::write(
        temp_dir.path().join("package.json"),
        r#"{
  "name": "locked",
  "dependencies": {
    "a": "^1.0.0"
  }
}
"#,
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("package-lock.json"),
        r#"{
  "lockfileVersion": 3,
  "packages": {
    "": { "name": "locked" },
    "node_modules/a": { "version": "1.0.0", "engines": { "node": ">=18.0.0" } }
  }
}
"#,
    )
    .unwrap();
    temp_dir
}

fn read(dir: &Path, file: &str) -> String {
    fs::read_to_string(dir.join(file)).unwrap()
}

mod cli_basics {
    use super::*;

    #[test]
    fn test_help_lists_subcommands() {
        packman()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("analyze"))
            .stdout(predicate::str::contains("apply"));
    }

    #[test]
    fn test_version() {
        packman()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("packman"))
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_missing_subcommand() {
        packman().assert().failure().code(2);
    }

    #[test]
    fn test_invalid_dependency_type() {
        packman()
            .args(["analyze", "--types", "peer"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("invalid dependency type"));
    }

    #[test]
    fn test_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        packman()
            .arg("analyze")
            .arg(temp_dir.path().join("missing"))
            .assert()
            .code(2)
            .stderr(predicate::str::contains("directory not found"));
    }

    #[test]
    fn test_directory_without_manifest() {
        let temp_dir = tempfile::tempdir().unwrap();
        packman()
            .arg("analyze")
            .arg(temp_dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("manifest file not found"));
    }

    #[test]
    fn test_invalid_config_file() {
        let temp_dir = create_bare_project(">=18.0.0");
        fs::write(temp_dir.path().join("packman.toml"), "concurrency = \"many\"").unwrap();
        packman()
            .arg("analyze")
            .arg(temp_dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("failed to parse config file"));
    }
}

mod analyze_command {
    use super::*;

    #[test]
    fn test_analyze_text_output() {
        let temp_dir = create_bare_project(">=20.0.0");
        packman()
            .arg("analyze")
            .arg(temp_dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("bare"))
            .stdout(predicate::str::contains("Node.js range  >=20.0.0 <=24.11.0"));
    }

    #[test]
    fn test_analyze_json_schema() {
        let temp_dir = create_bare_project(">=20.0.0");
        let output = packman()
            .args(["analyze", "--json"])
            .arg(temp_dir.path())
            .output()
            .expect("Failed to execute command");
        assert!(output.status.success());

        let json: serde_json::Value =
            serde_json::from_slice(&output.stdout).expect("Output should be valid JSON");
        let project = &json["projects"][0];
        assert_eq!(project["name"], "bare");
        assert_eq!(project["engines"], ">=20.0.0");
        assert_eq!(project["range"], ">=20.0.0 <=24.11.0");
        assert_eq!(project["constraint_count"], 1);
        assert_eq!(project["contradictory"], false);
        assert!(project["dependencies"].as_array().unwrap().is_empty());
        assert!(project["tiers"].is_object());
    }

    #[test]
    fn test_analyze_contradiction_exit_code() {
        let temp_dir = create_bare_project(">=99.0.0");
        packman()
            .arg("analyze")
            .arg(temp_dir.path())
            .assert()
            .code(1)
            .stdout(predicate::str::contains("no Node.js version satisfies"));
    }

    #[test]
    fn test_analyze_filtered_out_dependencies_need_no_registry() {
        let temp_dir = create_locked_project();
        packman()
            .args(["analyze", "--types", "dev"])
            .arg(temp_dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains(">=18.0.0 <=24.11.0"));
    }
}

mod apply_command {
    use super::*;

    #[test]
    fn test_apply_requires_an_operation() {
        let temp_dir = create_bare_project(">=18.0.0");
        packman()
            .arg("apply")
            .arg(temp_dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("nothing to apply"));
    }

    #[test]
    fn test_apply_rejects_conflicting_options() {
        let temp_dir = create_bare_project(">=18.0.0");
        packman()
            .args(["apply", "--all-highest", "--update", "a@1.0.0"])
            .arg(temp_dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("conflicting options"));
    }

    #[test]
    fn test_apply_invalid_update_spec() {
        let temp_dir = create_locked_project();
        packman()
            .args(["apply", "--update", "a"])
            .arg(temp_dir.path())
            .assert()
            .code(1)
            .stdout(predicate::str::contains("invalid operation 'a'"));
        assert!(read(temp_dir.path(), "package.json").contains("\"a\": \"^1.0.0\""));
    }

    #[test]
    fn test_apply_missing_entry_leaves_manifest() {
        let temp_dir = create_locked_project();
        let before = read(temp_dir.path(), "package.json");

        let output = packman()
            .args(["apply", "--json", "--update", "left-pad@1.3.0"])
            .arg(temp_dir.path())
            .output()
            .expect("Failed to execute command");
        assert_eq!(output.status.code(), Some(1));

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        let op = &json["projects"][0]["operations"][0];
        assert_eq!(op["name"], "left-pad");
        assert_eq!(op["status"], "failed");
        assert_eq!(op["error_kind"], "config_mutation");
        assert_eq!(json["summary"]["errors"], 1);

        assert_eq!(read(temp_dir.path(), "package.json"), before);
    }

    #[test]
    fn test_apply_set_engines() {
        let temp_dir = create_locked_project();
        packman()
            .args(["apply", "--set-engines"])
            .arg(temp_dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("engines.node set to >=18.0.0 <=24.11.0"));

        let manifest: serde_json::Value =
            serde_json::from_str(&read(temp_dir.path(), "package.json")).unwrap();
        assert_eq!(manifest["engines"]["node"], ">=18.0.0 <=24.11.0");
        assert_eq!(manifest["dependencies"]["a"], "^1.0.0");
        assert!(read(temp_dir.path(), "package.json").ends_with("}\n"));
    }

    #[test]
    fn test_apply_set_engines_recursive() {
        let temp_dir = create_locked_project();
        let nested = temp_dir.path().join("packages/site");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("package.json"), "{\n  \"name\": \"site\"\n}\n").unwrap();

        packman()
            .args(["apply", "--set-engines", "-r"])
            .arg(temp_dir.path())
            .assert()
            .code(1)
            .stdout(predicate::str::contains("no Node.js version satisfies every constraint"));

        // the root project is still updated
        assert!(read(temp_dir.path(), "package.json").contains(">=18.0.0 <=24.11.0"));
        assert_eq!(read(&nested, "package.json"), "{\n  \"name\": \"site\"\n}\n");
    }
}
