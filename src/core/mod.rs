// ─── Hornet Mod Manager Core ───
// Install logic for the Hollow Knight mod-loader stack, decoupled from the GUI.
//
// Architecture:
//   core/
//     install/    — Prober, Fetcher, Extractor, Merge-Installer, Orchestrator
//     platform/   — (os, arch) → release-asset name patterns
//     settings/   — theme + game path settings store
//     oneclick/   — gamebanana:// links, mod metadata, mod installs
//     state/      — Global application state

pub mod error;
pub mod http;
pub mod install;
pub mod oneclick;
pub mod platform;
pub mod settings;
pub mod state;
