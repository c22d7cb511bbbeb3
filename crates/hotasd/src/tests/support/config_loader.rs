//! Launch configurations rooted in a temporary directory.

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use camino::Utf8PathBuf;
use ortho_config::{OrthoConfig, OrthoError};
use tempfile::TempDir;

use hotas_config::{Config, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

/// Loader that places the socket, runtime artefacts and device
/// configuration under one temporary directory.
#[derive(Clone)]
pub struct TestConfigLoader {
    dir: Arc<TempDir>,
    config: Config,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .expect("temporary directory was not valid UTF-8");
        let config = Config {
            daemon_socket: SocketEndpoint::unix(root.join("hotasd.sock")),
            device_config: root.join("hotasd.toml"),
            ..Config::default()
        };
        Self {
            dir: Arc::new(dir),
            config,
        }
    }

    #[must_use]
    pub fn requiring_device(mut self) -> Self {
        self.config.require_device = true;
        self
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: &[&str]) -> Self {
        self.config.overrides = overrides.iter().map(|item| (*item).to_owned()).collect();
        self
    }

    pub fn artefact(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn write_device_config(&self, contents: &str) {
        std::fs::write(self.config.device_config(), contents).expect("write device config");
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that intentionally fails by passing an invalid socket flag.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("hotasd"),
            OsString::from("--daemon-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
