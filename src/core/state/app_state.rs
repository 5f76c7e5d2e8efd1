use std::path::PathBuf;

use reqwest::Client;

use crate::core::http::build_http_client;
use crate::core::settings::{default_settings_path, Settings};

/// Shared application state, managed by tauri behind `Arc<Mutex<_>>`.
pub struct AppState {
    pub http_client: Client,
    pub settings: Settings,
    pub settings_path: PathBuf,
    /// Set while a loader-stack or mod install is running; a second
    /// install request is rejected instead of queued.
    pub install_running: bool,
    /// One-click URL the process was launched with, held until the
    /// frontend asks for it.
    pub pending_oneclick: Option<String>,
}

impl AppState {
    pub fn new(pending_oneclick: Option<String>) -> Self {
        let settings_path = default_settings_path();
        let settings = Settings::load_or_init(&settings_path);

        let http_client = build_http_client().expect("Failed to build HTTP client");

        Self {
            http_client,
            settings,
            settings_path,
            install_running: false,
            pending_oneclick,
        }
    }

    pub fn save_settings(&self) -> std::io::Result<()> {
        self.settings.save(&self.settings_path)
    }
}
