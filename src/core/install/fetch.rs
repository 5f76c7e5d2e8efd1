use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use super::component::DownloadSource;
use crate::core::error::{ManagerError, ManagerResult};

/// Progress of one streamed download. `total_bytes` is `None` when the
/// server declares no content length; callers must render that as an
/// indeterminate state.
#[derive(Debug, Clone, Copy)]
pub struct DownloadProgress {
    pub bytes_downloaded: u64,
    pub total_bytes: Option<u64>,
}

impl DownloadProgress {
    /// Fraction complete in `[0, 1]`, or `None` when the total is unknown.
    pub fn fraction(&self) -> Option<f32> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                Some((self.bytes_downloaded as f32 / total as f32).min(1.0))
            }
            _ => None,
        }
    }
}

pub type ProgressSink<'a> = &'a (dyn Fn(DownloadProgress) + Send + Sync);

// The declared content length guides preallocation only up to this bound;
// a bogus header must not trigger a huge up-front allocation.
const PREALLOC_CAP_BYTES: u64 = 64 * 1024 * 1024;

fn initial_capacity(total_bytes: Option<u64>) -> usize {
    total_bytes.unwrap_or(0).min(PREALLOC_CAP_BYTES) as usize
}

#[derive(Debug, Clone, Deserialize)]
struct ReleaseListing {
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReleaseAsset {
    name: String,
    browser_download_url: String,
}

/// Streaming release-archive downloader.
///
/// Failure classification: transport errors map to `Network` (the caller
/// may retry by re-running the whole orchestrator), non-2xx statuses to
/// `Remote`, and ambiguous or empty asset listings to `Resolution`. No
/// retries happen here.
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Resolve `source` to a concrete URL and download it into memory,
    /// reporting progress after every chunk.
    pub async fn fetch(
        &self,
        source: &DownloadSource,
        on_progress: ProgressSink<'_>,
    ) -> ManagerResult<Vec<u8>> {
        let url = self.resolve(source).await?;
        info!("Downloading {url}");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::Remote {
                url,
                status: status.as_u16(),
            });
        }

        let total_bytes = response.content_length().filter(|len| *len > 0);
        let mut body = Vec::with_capacity(initial_capacity(total_bytes));
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            body.extend_from_slice(&chunk);
            on_progress(DownloadProgress {
                bytes_downloaded: body.len() as u64,
                total_bytes,
            });
        }

        debug!("Downloaded {} bytes from {url}", body.len());
        Ok(body)
    }

    async fn resolve(&self, source: &DownloadSource) -> ManagerResult<String> {
        match source {
            DownloadSource::Direct { url } => Ok(url.clone()),
            DownloadSource::LatestRelease {
                releases_url,
                name_pattern,
                exclude,
            } => {
                let response = self.client.get(releases_url).send().await?;
                let status = response.status();
                if !status.is_success() {
                    return Err(ManagerError::Remote {
                        url: releases_url.clone(),
                        status: status.as_u16(),
                    });
                }
                let listing = response.json::<ReleaseListing>().await?;
                let asset = select_asset(&listing.assets, name_pattern, exclude)?;
                debug!("Resolved {name_pattern:?} to asset {}", asset.name);
                Ok(asset.browser_download_url.clone())
            }
        }
    }
}

/// Pick the one asset matching `pattern` (case-insensitive substring) and
/// none of the `exclude` substrings. Zero or multiple matches surface all
/// candidate names instead of guessing; a wrong pick would corrupt the
/// install, a loud failure only delays it.
fn select_asset<'a>(
    assets: &'a [ReleaseAsset],
    pattern: &str,
    exclude: &[String],
) -> ManagerResult<&'a ReleaseAsset> {
    let pattern_lower = pattern.to_ascii_lowercase();
    let matches: Vec<&ReleaseAsset> = assets
        .iter()
        .filter(|asset| {
            let name = asset.name.to_ascii_lowercase();
            name.contains(&pattern_lower)
                && !exclude
                    .iter()
                    .any(|excluded| name.contains(&excluded.to_ascii_lowercase()))
        })
        .collect();

    match matches.as_slice() {
        [single] => Ok(single),
        [] => Err(ManagerError::Resolution {
            pattern: pattern.to_string(),
            candidates: assets.iter().map(|asset| asset.name.clone()).collect(),
        }),
        ambiguous => Err(ManagerError::Resolution {
            pattern: pattern.to_string(),
            candidates: ambiguous.iter().map(|asset| asset.name.clone()).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            browser_download_url: format!("https://example.invalid/{name}"),
        }
    }

    #[test]
    fn selects_the_single_matching_asset() {
        let assets = vec![
            asset("BepInEx_win_x64_5.4.23.4.zip"),
            asset("BepInEx_linux_x64_5.4.23.4.zip"),
            asset("BepInEx_macos_x64_5.4.23.4.zip"),
        ];
        let picked = select_asset(&assets, "linux_x64", &[]).expect("one match");
        assert_eq!(picked.name, "BepInEx_linux_x64_5.4.23.4.zip");
    }

    #[test]
    fn exclusion_filter_drops_patcher_variants() {
        let assets = vec![
            asset("BepInEx_win_x64_5.4.23.4.zip"),
            asset("BepInEx_patcher_win_x64_5.4.23.4.zip"),
        ];
        let picked =
            select_asset(&assets, "win_x64", &["patcher".to_string()]).expect("one match");
        assert_eq!(picked.name, "BepInEx_win_x64_5.4.23.4.zip");
    }

    #[test]
    fn ambiguous_matches_list_every_candidate() {
        let assets = vec![
            asset("MonoMod-22.07.31.01-net50.zip"),
            asset("MonoMod-RuntimeDetour-net50.zip"),
        ];
        let err = select_asset(&assets, "net50", &[]).expect_err("ambiguous");
        let ManagerError::Resolution { candidates, .. } = err else {
            panic!("expected resolution error");
        };
        assert_eq!(candidates.len(), 2);
        assert!(candidates.contains(&"MonoMod-22.07.31.01-net50.zip".to_string()));
        assert!(candidates.contains(&"MonoMod-RuntimeDetour-net50.zip".to_string()));
    }

    #[test]
    fn zero_matches_fail_with_the_full_listing() {
        let assets = vec![asset("ModdingApiWin.zip"), asset("ModdingApiMac.zip")];
        let err = select_asset(&assets, "ModdingApiLinux", &[]).expect_err("no match");
        let ManagerError::Resolution { candidates, .. } = err else {
            panic!("expected resolution error");
        };
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn matching_ignores_case() {
        let assets = vec![asset("ModdingApiWin.zip")];
        assert!(select_asset(&assets, "moddingapiwin", &[]).is_ok());
    }

    #[test]
    fn preallocation_is_capped_against_bogus_content_lengths() {
        assert_eq!(initial_capacity(None), 0);
        assert_eq!(initial_capacity(Some(1024)), 1024);
        assert_eq!(initial_capacity(Some(u64::MAX)), PREALLOC_CAP_BYTES as usize);
    }

    #[test]
    fn fraction_degrades_to_indeterminate_without_a_total() {
        let unknown = DownloadProgress {
            bytes_downloaded: 1024,
            total_bytes: None,
        };
        assert_eq!(unknown.fraction(), None);

        let known = DownloadProgress {
            bytes_downloaded: 512,
            total_bytes: Some(1024),
        };
        assert_eq!(known.fraction(), Some(0.5));
    }
}
