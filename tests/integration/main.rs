//! Integration tests for assetsync

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const BUNDLE: &str = r#"{
        "resources": {
            "/": "aaa",
            "index.html": "aaa",
            "main.js": "bbb",
            "assets/logo.png": "ccc"
        },
        "shell": ["main.js", "/"]
    }"#;

    /// Command isolated from the user's config, state and environment
    fn assetsync(home: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("assetsync");
        cmd.current_dir(home.path())
            .env_remove("ASSETSYNC_CONFIG")
            .env_remove("ASSETSYNC_ORIGIN")
            .env_remove("ASSETSYNC_BUNDLE")
            .env_remove("ASSETSYNC_STORE")
            .env("XDG_STATE_HOME", home.path().join("state"))
            .env("XDG_DATA_HOME", home.path().join("data"))
            .arg("--no-local")
            .arg("--config")
            .arg(home.path().join("config.toml"));
        cmd
    }

    /// Command with an origin, a bundle file and a store directory
    fn deployed(home: &TempDir) -> Command {
        deployed_at(home, "https://app.test")
    }

    fn deployed_at(home: &TempDir, origin: &str) -> Command {
        let bundle = home.path().join("bundle.json");
        fs::write(&bundle, BUNDLE).unwrap();

        let mut cmd = assetsync(home);
        cmd.arg("--origin")
            .arg(origin)
            .arg("--bundle")
            .arg(&bundle)
            .arg("--store")
            .arg(home.path().join("caches"));
        cmd
    }

    fn write_build(dir: &Path) {
        fs::create_dir_all(dir.join("assets")).unwrap();
        fs::write(dir.join("index.html"), "<html></html>").unwrap();
        fs::write(dir.join("main.js"), "main()").unwrap();
        fs::write(dir.join("assets/logo.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        assetsync(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline-first asset cache synchronizer"));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        assetsync(&home)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("assetsync"));
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        assetsync(&home)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let home = TempDir::new().unwrap();
        assetsync(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("assetsync-content"));
    }

    #[test]
    fn config_set_then_show() {
        let home = TempDir::new().unwrap();
        assetsync(&home)
            .args(["config", "set", "origin.url", "https://app.test"])
            .assert()
            .success();

        assetsync(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("https://app.test"));
    }

    #[test]
    fn config_set_unknown_key() {
        let home = TempDir::new().unwrap();
        assetsync(&home)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn manifest_fingerprints_build_dir() {
        let home = TempDir::new().unwrap();
        let build = home.path().join("build");
        write_build(&build);

        assetsync(&home)
            .arg("manifest")
            .arg(&build)
            .args(["--shell", "main.js,/"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"assets/logo.png\""))
            .stdout(predicate::str::contains("\"/\""))
            .stdout(predicate::str::contains("\"shell\""));
    }

    #[test]
    fn manifest_rejects_unknown_shell_path() {
        let home = TempDir::new().unwrap();
        let build = home.path().join("build");
        write_build(&build);

        assetsync(&home)
            .arg("manifest")
            .arg(&build)
            .args(["--shell", "missing.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing.js"));
    }

    #[test]
    fn install_requires_origin() {
        let home = TempDir::new().unwrap();
        assetsync(&home)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Origin not configured"));
    }

    #[test]
    fn install_requires_bundle() {
        let home = TempDir::new().unwrap();
        assetsync(&home)
            .args(["--origin", "https://app.test", "install"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Bundle file not found"));
    }

    #[test]
    fn status_reports_nothing_cached() {
        let home = TempDir::new().unwrap();
        deployed(&home)
            .args(["status", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"installed\": \"absent\""))
            .stdout(predicate::str::contains("\"cached\": 0"))
            .stdout(predicate::str::contains("main.js"));
    }

    #[test]
    fn activate_without_install_resets() {
        let home = TempDir::new().unwrap();
        deployed(&home)
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Cache reconciliation failed"));
    }

    #[test]
    fn unknown_message_is_ignored() {
        let home = TempDir::new().unwrap();
        deployed(&home)
            .args(["message", "refresh"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ignored unknown message"));
    }

    #[test]
    fn unreachable_origin_suggests_retry() {
        let home = TempDir::new().unwrap();
        deployed_at(&home, "http://127.0.0.1:1")
            .args(["get", "http://127.0.0.1:1/main.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Fetch failed"))
            .stderr(predicate::str::contains("Retry once the origin is reachable"));
    }

    #[test]
    fn non_get_request_is_passed_through() {
        let home = TempDir::new().unwrap();
        deployed(&home)
            .args(["get", "-X", "POST", "https://app.test/main.js"])
            .assert()
            .success()
            .stderr(predicate::str::contains("not handled by the cache"));
    }
}
