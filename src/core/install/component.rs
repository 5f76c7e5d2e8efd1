use serde::{Deserialize, Serialize};

use crate::core::error::ManagerResult;
use crate::core::platform;

// Known-good versions used by the pinned release policy.
const BEPINEX_PINNED_VERSION: &str = "5.4.23.4";
const MONOMOD_PINNED_VERSION: &str = "22.07.31.01";
const MODDING_API_PINNED_VERSION: &str = "1.5.78.11833-74";

const BEPINEX_RELEASES_URL: &str = "https://api.github.com/repos/BepInEx/BepInEx/releases/latest";
const MONOMOD_RELEASES_URL: &str = "https://api.github.com/repos/MonoMod/MonoMod/releases/latest";
const MODDING_API_RELEASES_URL: &str =
    "https://api.github.com/repos/hk-modding/api/releases/latest";

/// Files or directories whose presence marks a plausible game root.
/// Unity ships different casings per platform, hence the variants.
pub const TARGET_MARKERS: &[&str] = &[
    "hollow_knight.exe",
    "Hollow Knight.exe",
    "hollow_knight.x86_64",
    "hollow_knight_Data",
    "Hollow Knight_Data",
    "Hollow Knight.app",
];

/// One installable subsystem of the mod-loader stack.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    /// BepInEx: the runtime patcher injected next to the game executable.
    RuntimePatcher,
    /// MonoMod: the patch framework BepInEx plugins build on. Lives in a
    /// subfolder of the BepInEx tree, so it installs after BepInEx.
    PatchFramework,
    /// The Hollow Knight Modding API (hk-modding/api).
    ModdingApi,
}

/// Where the Archive Fetcher gets a component's archive from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    /// A static URL pointing at a pinned release asset.
    Direct { url: String },
    /// Resolve against a release-listing endpoint: pick the single asset
    /// whose name contains `name_pattern` and none of the `exclude` strings.
    LatestRelease {
        releases_url: String,
        name_pattern: String,
        exclude: Vec<String>,
    },
}

/// Whether to install the pinned known-good versions or float to the
/// newest published release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleasePolicy {
    #[default]
    Pinned,
    Latest,
}

impl Component {
    /// Fixed dependency order: the Modding API merge assumes the BepInEx
    /// directory layout already exists, and MonoMod lands inside it.
    pub const INSTALL_ORDER: [Component; 3] = [
        Component::RuntimePatcher,
        Component::PatchFramework,
        Component::ModdingApi,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            Component::RuntimePatcher => "BepInEx",
            Component::PatchFramework => "MonoMod",
            Component::ModdingApi => "Modding API",
        }
    }

    /// Marker paths relative to the install root. Presence of ANY marker
    /// means the component is installed; partial and hand-rolled installs
    /// are common, so a single surviving marker counts.
    pub fn markers(&self) -> &'static [&'static str] {
        match self {
            Component::RuntimePatcher => &["BepInEx/core", "doorstop_config.ini", "winhttp.dll"],
            Component::PatchFramework => &["BepInEx/MonoMod", "BepInEx/monomod"],
            Component::ModdingApi => &[
                "hollow_knight_Data/Managed/Mods",
                "Hollow Knight_Data/Managed/Mods",
                "hollow_knight_Data/Managed/MMHOOK_Assembly-CSharp.dll",
            ],
        }
    }

    /// Subpath under the install root the staged tree merges into.
    /// BepInEx and the Modding API unpack straight into the game root;
    /// MonoMod nests under the BepInEx folder created one step earlier.
    pub fn destination_subpath(&self) -> &'static str {
        match self {
            Component::RuntimePatcher => "",
            Component::PatchFramework => "BepInEx/MonoMod",
            Component::ModdingApi => "",
        }
    }

    pub fn source(&self, policy: ReleasePolicy) -> ManagerResult<DownloadSource> {
        match policy {
            ReleasePolicy::Pinned => self.pinned_source(),
            ReleasePolicy::Latest => self.latest_source(),
        }
    }

    fn pinned_source(&self) -> ManagerResult<DownloadSource> {
        let url = match self {
            Component::RuntimePatcher => {
                let tag = platform::current_bepinex_tag()?;
                format!(
                    "https://github.com/BepInEx/BepInEx/releases/download/v{v}/BepInEx_{tag}_{v}.zip",
                    v = BEPINEX_PINNED_VERSION
                )
            }
            Component::PatchFramework => format!(
                "https://github.com/MonoMod/MonoMod/releases/download/v{v}/MonoMod-{v}-net50.zip",
                v = MONOMOD_PINNED_VERSION
            ),
            Component::ModdingApi => {
                let tag = platform::current_modding_api_tag()?;
                format!(
                    "https://github.com/hk-modding/api/releases/download/{v}/ModdingApi{tag}.zip",
                    v = MODDING_API_PINNED_VERSION
                )
            }
        };
        Ok(DownloadSource::Direct { url })
    }

    fn latest_source(&self) -> ManagerResult<DownloadSource> {
        let source = match self {
            Component::RuntimePatcher => DownloadSource::LatestRelease {
                releases_url: BEPINEX_RELEASES_URL.to_string(),
                name_pattern: platform::current_bepinex_tag()?,
                exclude: vec!["patcher".to_string()],
            },
            Component::PatchFramework => DownloadSource::LatestRelease {
                releases_url: MONOMOD_RELEASES_URL.to_string(),
                name_pattern: "net50".to_string(),
                exclude: vec!["patcher".to_string(), "dbg".to_string()],
            },
            Component::ModdingApi => DownloadSource::LatestRelease {
                releases_url: MODDING_API_RELEASES_URL.to_string(),
                name_pattern: format!("ModdingApi{}", platform::current_modding_api_tag()?),
                exclude: vec![],
            },
        };
        Ok(source)
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_order_is_patcher_framework_api() {
        assert_eq!(
            Component::INSTALL_ORDER,
            [
                Component::RuntimePatcher,
                Component::PatchFramework,
                Component::ModdingApi
            ]
        );
    }

    #[test]
    fn every_component_declares_markers() {
        for component in Component::INSTALL_ORDER {
            assert!(!component.markers().is_empty(), "{component} has no markers");
        }
    }

    #[test]
    fn monomod_nests_under_bepinex() {
        assert_eq!(
            Component::PatchFramework.destination_subpath(),
            "BepInEx/MonoMod"
        );
    }

    #[test]
    fn pinned_sources_carry_known_good_versions() {
        let DownloadSource::Direct { url } = Component::PatchFramework
            .pinned_source()
            .expect("monomod source")
        else {
            panic!("pinned source must be direct");
        };
        assert!(url.contains(MONOMOD_PINNED_VERSION));
        assert!(url.ends_with(".zip"));
    }

    #[test]
    fn latest_sources_point_at_release_listings() {
        let source = Component::PatchFramework
            .latest_source()
            .expect("monomod source");
        let DownloadSource::LatestRelease { releases_url, .. } = source else {
            panic!("latest source must resolve a listing");
        };
        assert!(releases_url.contains("/releases/latest"));
    }
}
