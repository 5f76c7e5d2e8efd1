//! GameBanana one-click support: parsing `gamebanana://` links, fetching
//! advisory mod metadata, and downloading/unpacking individual mods.
//!
//! This flow is separate from the loader-stack install; it reuses the
//! Archive Fetcher and Extractor but never touches the orchestrator.

use std::path::{Path, PathBuf};

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::core::error::{ManagerError, ManagerResult};
use crate::core::install::component::DownloadSource;
use crate::core::install::extract::extract;
use crate::core::install::fetch::{Fetcher, ProgressSink};
use crate::core::install::probe::validate_target;

pub const ONECLICK_SCHEME: &str = "gamebanana";

const MOD_INFO_URL: &str = "https://api.gamebanana.com/Core/Item/Data";
const MOD_INFO_FIELDS: &str = "name,Owner().name,screenshots,likes,views,downloads,description,Game().name,Rootcategory().name,date,Files().aFiles()";

/// Extract the mod id from a one-click link. Both shapes seen in the
/// wild are accepted: `gamebanana://install/<id>` and
/// `gamebanana://install/mod/<id>`.
pub fn parse_oneclick_url(raw: &str) -> Option<String> {
    let url = Url::parse(raw).ok()?;
    if url.scheme() != ONECLICK_SCHEME || url.host_str() != Some("install") {
        return None;
    }

    let mut segments: Vec<&str> = url
        .path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    if segments.first() == Some(&"mod") {
        segments.remove(0);
    }

    match segments.as_slice() {
        [mod_id] if !mod_id.is_empty() => Some((*mod_id).to_string()),
        _ => None,
    }
}

/// Advisory metadata shown before an install. The upstream endpoint
/// returns a positional array; fields past the end default rather than
/// fail, matching how sparse older entries look.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModInfo {
    pub mod_id: String,
    pub name: String,
    pub author: String,
    pub screenshots: Value,
    pub likes: u64,
    pub views: u64,
    pub downloads: u64,
    pub description: String,
    pub game: String,
    pub category: String,
    pub date: i64,
    pub files: Value,
}

fn mod_info_from_fields(mod_id: &str, fields: &[Value]) -> ModInfo {
    let text = |index: usize, fallback: &str| -> String {
        fields
            .get(index)
            .and_then(Value::as_str)
            .unwrap_or(fallback)
            .to_string()
    };
    let count = |index: usize| -> u64 { fields.get(index).and_then(Value::as_u64).unwrap_or(0) };

    ModInfo {
        mod_id: mod_id.to_string(),
        name: text(0, "Unknown"),
        author: text(1, "Unknown"),
        screenshots: fields.get(2).cloned().unwrap_or(Value::Null),
        likes: count(3),
        views: count(4),
        downloads: count(5),
        description: text(6, ""),
        game: text(7, "Unknown"),
        category: text(8, "Unknown"),
        date: fields.get(9).and_then(Value::as_i64).unwrap_or(0),
        files: fields.get(10).cloned().unwrap_or(Value::Null),
    }
}

fn download_page_url(mod_id: &str) -> String {
    format!("https://gamebanana.com/apiv11/Mod/{mod_id}/DownloadPage")
}

/// First downloadable file on a mod's download page.
fn download_url_from_page(page: &Value) -> ManagerResult<String> {
    page.get("_aFiles")
        .and_then(Value::as_array)
        .and_then(|files| files.first())
        .and_then(|file| file.get("_sDownloadUrl"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ManagerError::Other("No downloadable files in API response".into()))
}

/// Client for the mod-hosting site's read-only API.
pub struct ModPortal {
    client: Client,
    fetcher: Fetcher,
}

impl ModPortal {
    pub fn new(client: Client) -> Self {
        Self {
            fetcher: Fetcher::new(client.clone()),
            client,
        }
    }

    pub async fn mod_info(&self, mod_id: &str) -> ManagerResult<ModInfo> {
        let response = self
            .client
            .get(MOD_INFO_URL)
            .query(&[
                ("itemtype", "Mod"),
                ("itemid", mod_id),
                ("fields", MOD_INFO_FIELDS),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::Remote {
                url: MOD_INFO_URL.to_string(),
                status: status.as_u16(),
            });
        }

        let fields = response.json::<Vec<Value>>().await?;
        Ok(mod_info_from_fields(mod_id, &fields))
    }

    async fn resolve_download_url(&self, mod_id: &str) -> ManagerResult<String> {
        let url = download_page_url(mod_id);
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::Remote {
                url,
                status: status.as_u16(),
            });
        }
        let page = response.json::<Value>().await?;
        download_url_from_page(&page)
    }

    /// Download a mod archive and unpack it into its own folder under the
    /// target's `BepInEx/plugins` directory. The root must look like a
    /// game directory before anything is fetched or written.
    pub async fn install_mod(
        &self,
        mod_id: &str,
        target_root: &Path,
        on_progress: ProgressSink<'_>,
    ) -> ManagerResult<PathBuf> {
        validate_target(target_root)?;

        let url = self.resolve_download_url(mod_id).await?;
        let archive = self
            .fetcher
            .fetch(&DownloadSource::Direct { url }, on_progress)
            .await?;

        let destination = target_root
            .join("BepInEx")
            .join("plugins")
            .join(format!("mod_{mod_id}"));
        extract(&archive, &destination)?;
        info!("Installed mod {} into {:?}", mod_id, destination);
        Ok(destination)
    }
}
