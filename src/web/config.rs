//! Web server configuration.

use crate::error::{Result, SensorError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Page served at `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexPage {
    /// An HTML file read from disk on each request
    File(PathBuf),
    /// The dashboard compiled into the binary
    Builtin,
}

/// Configuration for the web server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    pub enable_cors: bool,
    /// Directory mounted at `/static`; its `index.html` becomes the dashboard
    pub static_path: Option<PathBuf>,
    /// Dashboard page overriding the static directory's `index.html`
    pub index_file: Option<PathBuf>,
    /// Fall back to the built-in dashboard when no page is found on disk
    pub builtin_dashboard: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_WEB_PORT,
            enable_cors: true,
            static_path: Some(PathBuf::from("public")),
            index_file: None,
            builtin_dashboard: true,
        }
    }
}

impl WebConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    pub fn with_static_path(mut self, path: Option<PathBuf>) -> Self {
        self.static_path = path;
        self
    }

    pub fn with_index_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_file = Some(path.into());
        self
    }

    pub fn with_builtin_dashboard(mut self, enabled: bool) -> Self {
        self.builtin_dashboard = enabled;
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Decide what `/` serves.
    ///
    /// An explicit `index_file` must exist. Otherwise `index.html` in the
    /// static directory is used if present, then the built-in dashboard if
    /// allowed. `None` means `/` answers 404.
    pub fn index_page(&self) -> Result<Option<IndexPage>> {
        if let Some(index_file) = &self.index_file {
            if !index_file.is_file() {
                return Err(SensorError::config_error(format!(
                    "Dashboard file {} does not exist",
                    index_file.display()
                )));
            }
            return Ok(Some(IndexPage::File(index_file.clone())));
        }

        let from_static = self
            .static_path
            .as_ref()
            .map(|dir| dir.join("index.html"))
            .filter(|candidate| candidate.is_file());

        Ok(match from_static {
            Some(path) => Some(IndexPage::File(path)),
            None if self.builtin_dashboard => Some(IndexPage::Builtin),
            None => None,
        })
    }
}
