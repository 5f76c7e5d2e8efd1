use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use super::component::{Component, TARGET_MARKERS};
use crate::core::error::{ManagerError, ManagerResult};

/// Presence verdict for a single component, with optional human-readable
/// detail lines for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentStatus {
    pub present: bool,
    pub details: Vec<String>,
}

/// Snapshot of what is installed under one game root. Computed fresh on
/// every call; installed state changes after each merge, so callers must
/// re-probe rather than hold on to an old result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub root: PathBuf,
    pub components: BTreeMap<Component, ComponentStatus>,
}

impl ProbeResult {
    pub fn is_present(&self, component: Component) -> bool {
        self.components
            .get(&component)
            .map(|status| status.present)
            .unwrap_or(false)
    }

    /// Components not yet installed, in fixed dependency order. This is
    /// the install plan for an orchestrator run.
    pub fn missing(&self) -> Vec<Component> {
        Component::INSTALL_ORDER
            .into_iter()
            .filter(|component| !self.is_present(*component))
            .collect()
    }
}

/// Inspect `root` and report which components are installed.
///
/// Fails with `InvalidTarget` when `root` carries none of the game
/// markers; everything else is read-only and infallible, so probing the
/// same unchanged tree twice returns identical results.
pub fn probe(root: &Path) -> ManagerResult<ProbeResult> {
    validate_target(root)?;

    let mut components = BTreeMap::new();
    for component in Component::INSTALL_ORDER {
        let present = component
            .markers()
            .iter()
            .any(|marker| root.join(marker).exists());
        let details = if present {
            component_details(root, component)
        } else {
            Vec::new()
        };
        debug!("probe {}: present={}", component, present);
        components.insert(component, ComponentStatus { present, details });
    }

    Ok(ProbeResult {
        root: root.to_path_buf(),
        components,
    })
}

/// Reject anything that does not look like a game root. Every operation
/// that writes under a root goes through this first.
pub fn validate_target(root: &Path) -> ManagerResult<()> {
    if !root.is_dir() {
        return Err(ManagerError::InvalidTarget {
            path: root.to_path_buf(),
            reason: "not a directory".into(),
        });
    }

    if TARGET_MARKERS.iter().any(|marker| root.join(marker).exists()) {
        return Ok(());
    }

    Err(ManagerError::InvalidTarget {
        path: root.to_path_buf(),
        reason: "no game executable or data folder found".into(),
    })
}

/// Best-effort detail lines. Missing optional sources yield an empty list,
/// never an error: the probe verdict must not depend on them.
fn component_details(root: &Path, component: Component) -> Vec<String> {
    match component {
        Component::RuntimePatcher => {
            let mut details = Vec::new();
            if root.join("doorstop_config.ini").exists() {
                details.push("doorstop config present".to_string());
            }
            details.extend(
                list_dir_names(&root.join("BepInEx").join("plugins"))
                    .into_iter()
                    .map(|name| format!("plugin: {name}")),
            );
            details
        }
        Component::PatchFramework => list_dir_names(&root.join("BepInEx").join("MonoMod"))
            .into_iter()
            .filter(|name| name.ends_with(".dll"))
            .map(|name| format!("assembly: {name}"))
            .collect(),
        Component::ModdingApi => {
            for managed in ["hollow_knight_Data", "Hollow Knight_Data"] {
                let mods = root.join(managed).join("Managed").join("Mods");
                if mods.is_dir() {
                    return list_dir_names(&mods)
                        .into_iter()
                        .map(|name| format!("mod: {name}"))
                        .collect();
                }
            }
            Vec::new()
        }
    }
}

fn list_dir_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn game_root() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("hollow_knight.exe"), b"").expect("marker");
        dir
    }

    #[test]
    fn rejects_directory_without_game_markers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = probe(dir.path()).expect_err("must refuse non-game dir");
        assert!(matches!(err, ManagerError::InvalidTarget { .. }));
    }

    #[test]
    fn fresh_game_root_reports_everything_missing() {
        let dir = game_root();
        let result = probe(dir.path()).expect("probe");
        assert_eq!(result.missing(), Component::INSTALL_ORDER.to_vec());
    }

    #[test]
    fn any_single_marker_counts_as_present() {
        // Core folder alone, no config, no shim dll.
        let dir = game_root();
        fs::create_dir_all(dir.path().join("BepInEx/core")).expect("marker dir");
        let by_dir = probe(dir.path()).expect("probe");
        assert!(by_dir.is_present(Component::RuntimePatcher));

        // Config file alone.
        let dir = game_root();
        fs::write(dir.path().join("doorstop_config.ini"), b"[General]").expect("marker file");
        let by_file = probe(dir.path()).expect("probe");
        assert!(by_file.is_present(Component::RuntimePatcher));
    }

    #[test]
    fn probe_is_stable_without_filesystem_changes() {
        let dir = game_root();
        fs::create_dir_all(dir.path().join("BepInEx/MonoMod")).expect("marker dir");
        let first = probe(dir.path()).expect("probe");
        let second = probe(dir.path()).expect("probe");
        assert_eq!(first, second);
    }

    #[test]
    fn partially_installed_root_plans_only_the_rest() {
        let dir = game_root();
        fs::create_dir_all(dir.path().join("BepInEx/core")).expect("marker dir");
        let result = probe(dir.path()).expect("probe");
        assert_eq!(
            result.missing(),
            vec![Component::PatchFramework, Component::ModdingApi]
        );
    }

    #[test]
    fn details_never_fail_when_optional_sources_are_missing() {
        let dir = game_root();
        // Marker file exists but the plugins folder does not.
        fs::write(dir.path().join("winhttp.dll"), b"").expect("marker file");
        let result = probe(dir.path()).expect("probe");
        let status = &result.components[&Component::RuntimePatcher];
        assert!(status.present);
        assert!(status.details.is_empty());
    }

    #[test]
    fn installed_mods_show_up_as_details() {
        let dir = game_root();
        let mods = dir.path().join("hollow_knight_Data/Managed/Mods");
        fs::create_dir_all(mods.join("CustomKnight")).expect("mod dir");
        let result = probe(dir.path()).expect("probe");
        let status = &result.components[&Component::ModdingApi];
        assert!(status.present);
        assert_eq!(status.details, vec!["mod: CustomKnight".to_string()]);
    }
}
