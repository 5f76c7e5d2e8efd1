mod commands;
mod core;

use std::sync::Arc;
use tauri::Manager;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::core::oneclick::parse_oneclick_url;
use crate::core::state::AppState;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,hornet_lib=debug")),
        )
        .init();

    tracing::info!("Hornet Mod Manager starting...");

    // A one-click launch passes the gamebanana:// link as the only
    // argument; stash it for the frontend to pick up once it loads.
    let pending_oneclick = std::env::args().nth(1).and_then(|arg| {
        if parse_oneclick_url(&arg).is_some() {
            tracing::info!("Launched with one-click URL {arg}");
            Some(arg)
        } else {
            None
        }
    });

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(move |app| {
            let state = AppState::new(pending_oneclick);
            app.manage(Arc::new(Mutex::new(state)));
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_settings,
            commands::update_settings,
            commands::probe_install_target,
            commands::install_loader_stack,
            commands::fetch_mod_info,
            commands::install_mod,
            commands::take_pending_oneclick_url,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
