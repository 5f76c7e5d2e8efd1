//! Pure mapping from (os, arch) to the asset-name tags used by the
//! upstream release archives. Kept free of network and filesystem access
//! so the branching is unit-testable on any host.

use crate::core::error::{ManagerError, ManagerResult};

/// Tag embedded in BepInEx archive names, e.g. `BepInEx_win_x64_5.4.23.4.zip`.
pub fn bepinex_platform_tag(os: &str, arch: &str) -> Option<String> {
    let os_tag = match os {
        "windows" => "win",
        "macos" => "macos",
        "linux" => "linux",
        _ => return None,
    };

    let arch_tag = match arch {
        "x86_64" => "x64",
        "x86" => "x86",
        _ => return None,
    };

    Some(format!("{os_tag}_{arch_tag}"))
}

/// Tag embedded in Modding API archive names, e.g. `ModdingApiWin.zip`.
pub fn modding_api_platform_tag(os: &str) -> Option<&'static str> {
    match os {
        "windows" => Some("Win"),
        "macos" => Some("Mac"),
        "linux" => Some("Linux"),
        _ => None,
    }
}

pub fn current_bepinex_tag() -> ManagerResult<String> {
    bepinex_platform_tag(std::env::consts::OS, std::env::consts::ARCH)
        .ok_or_else(unsupported_platform)
}

pub fn current_modding_api_tag() -> ManagerResult<&'static str> {
    modding_api_platform_tag(std::env::consts::OS).ok_or_else(unsupported_platform)
}

fn unsupported_platform() -> ManagerError {
    ManagerError::UnsupportedPlatform {
        os: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}
