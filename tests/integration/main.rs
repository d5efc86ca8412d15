//! Integration tests for intercache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn intercache(home: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("intercache");
        cmd.env_remove("INTERCACHE_CONFIG")
            .env_remove("INTERCACHE_CACHE_VERSION")
            .env("XDG_CONFIG_HOME", home.path().join("config"))
            .env("XDG_STATE_HOME", home.path().join("state"));
        cmd
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        intercache(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Request-intercepting offline cache"));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        intercache(&home)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("intercache"));
    }

    #[test]
    fn config_path_honors_flag() {
        let home = TempDir::new().unwrap();
        let path = home.path().join("custom.toml");
        intercache(&home)
            .args(["--config", path.to_str().unwrap(), "config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_init_then_show() {
        let home = TempDir::new().unwrap();
        let path = home.path().join("config.toml");
        let path = path.to_str().unwrap();

        intercache(&home)
            .args(["--config", path, "config", "init"])
            .assert()
            .success();
        intercache(&home)
            .args(["--config", path, "config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("already exists"));
        intercache(&home)
            .args(["--config", path, "config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("stock-auto-v7"));
    }

    #[test]
    fn invalid_config_reports_error() {
        let home = TempDir::new().unwrap();
        let path = home.path().join("config.toml");
        std::fs::write(&path, "[cache\nversion = ").unwrap();

        intercache(&home)
            .args(["--config", path.to_str().unwrap(), "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn push_shows_payload_title() {
        let home = TempDir::new().unwrap();
        intercache(&home)
            .args(["push", "--data", r#"{"title":"Stock bas","body":"Plaquettes"}"#])
            .assert()
            .success()
            .stdout(predicate::str::contains("Stock bas"))
            .stdout(predicate::str::contains("Plaquettes"));
    }

    #[test]
    fn push_without_data_uses_defaults() {
        let home = TempDir::new().unwrap();
        intercache(&home)
            .arg("push")
            .assert()
            .success()
            .stdout(predicate::str::contains("Stock Pièces Auto"))
            .stdout(predicate::str::contains("Nouvelle notification"));
    }

    #[test]
    fn click_opens_root_window() {
        let home = TempDir::new().unwrap();
        intercache(&home)
            .arg("click")
            .assert()
            .success()
            .stdout(predicate::str::contains("Opening window at /"));
    }

    #[test]
    fn sync_known_tag_completes() {
        let home = TempDir::new().unwrap();
        intercache(&home)
            .args(["sync", "sync-inventory"])
            .assert()
            .success()
            .stdout(predicate::str::contains("complete"));
    }

    #[test]
    fn sync_unknown_tag_is_ignored() {
        let home = TempDir::new().unwrap();
        intercache(&home)
            .args(["sync", "sync-orders"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No sync task registered"))
            .stdout(predicate::str::contains("Known tags: sync-inventory"));
    }
}

mod lifecycle_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::net::TcpStream;
    use std::path::PathBuf;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const INDEX: &str = "<html>Stock Pièces Auto</html>";

    const SITE: &[(&str, &str)] = &[
        ("/", INDEX),
        ("/index.html", INDEX),
        ("/manifest.json", r#"{"name":"Stock"}"#),
        ("/stock.json", r#"{"items":42}"#),
    ];

    const BROKEN_SITE: &[(&str, &str)] = &[("/", INDEX), ("/index.html", INDEX)];

    /// Start a dedicated server answering `routes`; anything else is a 404
    async fn serve(routes: &[(&str, &str)]) -> MockServer {
        // Not taken from the shared pool, so dropping it closes the port
        let server = MockServer::builder().start().await;
        for (route, body) in routes {
            Mock::given(method("GET"))
                .and(path(*route))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("content-type", "text/html")
                        .set_body_string(*body),
                )
                .mount(&server)
                .await;
        }
        server
    }

    /// Shut `server` down and wait until its port refuses connections
    fn go_offline(server: MockServer) {
        let address = *server.address();
        drop(server);

        let deadline = Instant::now() + Duration::from_secs(5);
        while TcpStream::connect_timeout(&address, Duration::from_millis(100)).is_ok() {
            assert!(Instant::now() < deadline, "server at {address} still accepting");
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    struct Workspace {
        home: TempDir,
        config: PathBuf,
    }

    impl Workspace {
        fn new(server: &MockServer) -> Self {
            let home = TempDir::new().unwrap();
            let config = home.path().join("config.toml");
            let storage = home.path().join("buckets");
            std::fs::write(
                &config,
                format!(
                    "[general]\naudit_log = false\n\n[cache]\nscope = \"{}/\"\nstorage_dir = \"{}\"\ntimeout_secs = 5\n",
                    server.uri(),
                    storage.display()
                ),
            )
            .unwrap();
            Self { home, config }
        }

        fn cmd(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("intercache");
            cmd.env_remove("INTERCACHE_CACHE_VERSION")
                .env("INTERCACHE_CONFIG", &self.config)
                .env("XDG_CONFIG_HOME", self.home.path().join("config"))
                .env("XDG_STATE_HOME", self.home.path().join("state"));
            cmd
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn install_serves_cached_pages_offline() {
        let server = serve(SITE).await;
        let ws = Workspace::new(&server);

        ws.cmd()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cached 3 essential resources"));

        ws.cmd()
            .args(["buckets", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("stock-auto-v7"));

        // Runtime response is written to the current bucket
        ws.cmd()
            .args(["fetch", "./stock.json", "--body"])
            .assert()
            .success()
            .stdout(predicate::str::contains("42"))
            .stderr(predicate::str::contains("via network"));

        go_offline(server);

        ws.cmd()
            .args(["fetch", "./index.html", "--body"])
            .assert()
            .success()
            .stdout(predicate::str::contains(INDEX))
            .stderr(predicate::str::contains("via cache"));

        ws.cmd()
            .args(["fetch", "./stock.json", "--body"])
            .assert()
            .success()
            .stdout(predicate::str::contains("42"))
            .stderr(predicate::str::contains("via cache"));

        ws.cmd()
            .args(["fetch", "./parts/brakes.html", "--body"])
            .assert()
            .success()
            .stdout(predicate::str::contains(INDEX))
            .stderr(predicate::str::contains("via fallback"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn cross_origin_redirect_is_not_cached() {
        let server = serve(SITE).await;
        let other = serve(&[("/foreign", "foreign")]).await;
        Mock::given(method("GET"))
            .and(path("/redir"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}/foreign", other.uri()).as_str()),
            )
            .mount(&server)
            .await;
        let ws = Workspace::new(&server);

        ws.cmd().arg("install").assert().success();
        ws.cmd()
            .args(["fetch", "./redir"])
            .assert()
            .success()
            .stderr(predicate::str::contains("opaque via network"));

        go_offline(other);
        go_offline(server);

        ws.cmd()
            .args(["fetch", "./redir", "--body"])
            .assert()
            .success()
            .stdout(predicate::str::contains(INDEX))
            .stderr(predicate::str::contains("via fallback"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_install_leaves_nothing_behind() {
        let server = serve(BROKEN_SITE).await;
        let ws = Workspace::new(&server);

        ws.cmd()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("manifest.json"));

        ws.cmd()
            .args(["buckets", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"entries\": 3").not());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn activating_new_version_removes_old_bucket() {
        let server = serve(SITE).await;
        let ws = Workspace::new(&server);

        ws.cmd().arg("install").assert().success();
        ws.cmd().arg("activate").assert().success();

        ws.cmd()
            .args(["--cache-version", "stock-auto-v8", "install"])
            .assert()
            .success();
        ws.cmd()
            .args(["--cache-version", "stock-auto-v8", "activate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted stock-auto-v7"))
            .stdout(predicate::str::contains("stock-auto-v7 superseded"));

        ws.cmd()
            .args(["buckets", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("stock-auto-v8"))
            .stdout(predicate::str::contains("stock-auto-v7").not());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn activate_before_install_fails() {
        let server = serve(SITE).await;
        let ws = Workspace::new(&server);

        ws.cmd()
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn status_reports_missing_bucket() {
        let server = serve(SITE).await;
        let ws = Workspace::new(&server);

        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("not provisioned"));
    }
}
