use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tauri::Emitter;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::error::ManagerError;
use crate::core::install::fetch::DownloadProgress;
use crate::core::install::{
    probe, InstallEvent, InstallOutcome, Orchestrator, ProbeResult, ReleasePolicy,
};
use crate::core::oneclick::{ModInfo, ModPortal};
use crate::core::settings::{GameTitle, Settings};
use crate::core::state::AppState;

#[derive(Debug, Clone, Serialize)]
struct ModDownloadEvent {
    mod_id: String,
    bytes_downloaded: u64,
    fraction: Option<f32>,
}

/// Game root from settings, or a hard refusal when none is configured.
async fn configured_root(
    state: &Arc<Mutex<AppState>>,
    game: GameTitle,
) -> Result<PathBuf, ManagerError> {
    let state = state.lock().await;
    state
        .settings
        .game_path(game)
        .ok_or_else(|| ManagerError::InvalidTarget {
            path: PathBuf::new(),
            reason: "no game folder configured".into(),
        })
}

/// Claim the single install slot, handing back a client for the run.
async fn begin_install(state: &Arc<Mutex<AppState>>) -> Result<reqwest::Client, ManagerError> {
    let mut state = state.lock().await;
    if state.install_running {
        return Err(ManagerError::Other("An install is already running".into()));
    }
    state.install_running = true;
    Ok(state.http_client.clone())
}

async fn finish_install(state: &Arc<Mutex<AppState>>) {
    state.lock().await.install_running = false;
}

#[tauri::command]
pub async fn get_settings(
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
) -> Result<Settings, ManagerError> {
    let state = state.lock().await;
    Ok(state.settings.clone())
}

#[tauri::command]
pub async fn update_settings(
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
    settings: Settings,
) -> Result<Settings, ManagerError> {
    let mut state = state.lock().await;
    state.settings = settings;
    if let Err(err) = state.save_settings() {
        warn!("Settings saved in memory only: {err}");
    }
    Ok(state.settings.clone())
}

#[tauri::command]
pub async fn probe_install_target(
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
    game: GameTitle,
) -> Result<ProbeResult, ManagerError> {
    let root = configured_root(state.inner(), game).await?;
    probe(&root)
}

#[tauri::command]
pub async fn install_loader_stack(
    app: tauri::AppHandle,
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
    game: GameTitle,
    policy: Option<ReleasePolicy>,
) -> Result<InstallOutcome, ManagerError> {
    let root = configured_root(state.inner(), game).await?;
    let client = begin_install(state.inner()).await?;

    info!("Loader stack install requested for {:?}", root);
    let orchestrator = Orchestrator::new(client, policy.unwrap_or_default());
    let sink = |event: InstallEvent| {
        let _ = app.emit("install-progress", event);
    };
    let result = orchestrator.run(&root, &sink).await;

    finish_install(state.inner()).await;
    result
}

#[tauri::command]
pub async fn fetch_mod_info(
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
    mod_id: String,
) -> Result<ModInfo, ManagerError> {
    let client = state.lock().await.http_client.clone();
    ModPortal::new(client).mod_info(&mod_id).await
}

#[tauri::command]
pub async fn install_mod(
    app: tauri::AppHandle,
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
    game: GameTitle,
    mod_id: String,
) -> Result<PathBuf, ManagerError> {
    let root = configured_root(state.inner(), game).await?;
    let client = begin_install(state.inner()).await?;

    info!("Mod {} install requested for {:?}", mod_id, root);
    let portal = ModPortal::new(client);
    let sink = |progress: DownloadProgress| {
        let _ = app.emit(
            "mod-install-progress",
            ModDownloadEvent {
                mod_id: mod_id.clone(),
                bytes_downloaded: progress.bytes_downloaded,
                fraction: progress.fraction(),
            },
        );
    };
    let result = portal.install_mod(&mod_id, &root, &sink).await;

    finish_install(state.inner()).await;
    result
}

#[tauri::command]
pub async fn take_pending_oneclick_url(
    state: tauri::State<'_, Arc<Mutex<AppState>>>,
) -> Result<Option<String>, ManagerError> {
    let mut state = state.lock().await;
    Ok(state.pending_oneclick.take())
}
