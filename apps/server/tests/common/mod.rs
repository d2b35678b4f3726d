//! Common test utilities and fixtures for integration tests.
//!
//! `TestContext` builds a temporary data directory holding generated
//! fixture packages, loads the sample package, and hands out `axum-test`
//! servers over the full router.

pub mod fixtures;

use std::path::{Path, PathBuf};
use std::time::Duration;

use axum_test::TestServer;
use tempfile::TempDir;

use anki_viewer_server::config::ServerConfig;
use anki_viewer_server::{build_router, AppState};

pub struct TestContext {
    data_dir: TempDir,
    pub state: AppState,
}

impl TestContext {
    /// Context with `sample.apkg` loaded and `other.apkg` available for
    /// switching.
    pub async fn new() -> Self {
        let data_dir = tempfile::tempdir().expect("create test data dir");
        fixtures::write_sample_package(data_dir.path(), "sample.apkg");
        fixtures::write_minimal_package(data_dir.path(), "other.apkg", "Other front", "Other back");

        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            data_dir: Some(data_dir.path().to_path_buf()),
            package_path: None,
            media_dir: data_dir.path().join("media"),
            media_url_path: "/media".to_string(),
            media_lookup_ttl: Duration::from_secs(5),
        };
        let state = AppState::new(config);
        state
            .load_package(data_dir.path().join("sample.apkg"), true)
            .await
            .expect("load sample package");

        Self { data_dir, state }
    }

    pub fn server(&self) -> TestServer {
        TestServer::new(build_router(self.state.clone())).expect("build test server")
    }

    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.path().join("media")
    }
}
