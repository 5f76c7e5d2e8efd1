use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use super::component::{Component, ReleasePolicy};
use super::extract::extract;
use super::fetch::{Fetcher, ProgressSink};
use super::merge::merge;
use super::probe::{probe, ProbeResult};
use super::staging::StagingArea;
use crate::core::error::ManagerResult;

/// Where the orchestrator gets component archives from. Production code
/// resolves and streams release assets; tests substitute canned bytes or
/// scripted failures.
#[async_trait]
pub trait ComponentFetch: Send + Sync {
    async fn fetch_component(
        &self,
        component: Component,
        policy: ReleasePolicy,
        on_progress: ProgressSink<'_>,
    ) -> ManagerResult<Vec<u8>>;
}

#[async_trait]
impl ComponentFetch for Fetcher {
    async fn fetch_component(
        &self,
        component: Component,
        policy: ReleasePolicy,
        on_progress: ProgressSink<'_>,
    ) -> ManagerResult<Vec<u8>> {
        let source = component.source(policy)?;
        self.fetch(&source, on_progress).await
    }
}

/// Phase of an install run, in the order they occur. The fetch/extract/
/// merge trio repeats once per missing component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPhase {
    Probing,
    Fetching,
    Extracting,
    Merging,
    Rescanning,
    Done,
    Failed,
}

/// Flat progress payload, shaped for direct emission as a window event.
#[derive(Debug, Clone, Serialize)]
pub struct InstallEvent {
    pub phase: InstallPhase,
    pub component: Option<Component>,
    /// Download fraction in `[0, 1]`; `None` outside fetches and for
    /// downloads with unknown size (indeterminate progress bar).
    pub fraction: Option<f32>,
    pub message: Option<String>,
}

impl InstallEvent {
    fn phase_only(phase: InstallPhase) -> Self {
        Self {
            phase,
            component: None,
            fraction: None,
            message: None,
        }
    }

    fn for_component(phase: InstallPhase, component: Component) -> Self {
        Self {
            phase,
            component: Some(component),
            fraction: None,
            message: None,
        }
    }
}

/// Callbacks must be cheap and must not panic; the orchestrator treats a
/// panicking sink as a caller bug, not a handled condition.
pub type EventSink<'a> = &'a (dyn Fn(InstallEvent) + Send + Sync);

/// What a finished run did, plus the authoritative post-install probe.
#[derive(Debug, Serialize)]
pub struct InstallOutcome {
    pub installed: Vec<Component>,
    pub skipped: Vec<Component>,
    pub probe: ProbeResult,
}

/// Sequences probe → fetch → extract → merge per missing component, in
/// fixed dependency order, then re-probes so callers observe real state
/// instead of this run's bookkeeping.
///
/// One run per target at a time; the caller enforces that (the UI
/// disables the install trigger while a run is active). On a step failure
/// the remaining plan is abandoned but already-merged components stay:
/// merges are idempotent, so the user retries by simply running again.
pub struct Orchestrator<F = Fetcher> {
    fetcher: F,
    policy: ReleasePolicy,
}

impl Orchestrator<Fetcher> {
    pub fn new(client: Client, policy: ReleasePolicy) -> Self {
        Self {
            fetcher: Fetcher::new(client),
            policy,
        }
    }
}

impl<F: ComponentFetch> Orchestrator<F> {
    pub fn with_fetcher(fetcher: F, policy: ReleasePolicy) -> Self {
        Self { fetcher, policy }
    }

    pub async fn run(&self, root: &Path, report: EventSink<'_>) -> ManagerResult<InstallOutcome> {
        report(InstallEvent::phase_only(InstallPhase::Probing));
        let before = probe(root)?;

        let plan = before.missing();
        let skipped: Vec<Component> = Component::INSTALL_ORDER
            .into_iter()
            .filter(|component| before.is_present(*component))
            .collect();
        info!("Install plan for {:?}: {:?} (skipping {:?})", root, plan, skipped);

        let staging = StagingArea::create()?;
        let mut installed = Vec::new();

        for component in plan {
            if let Err(err) = self
                .install_component(component, root, &staging, report)
                .await
            {
                error!("Install of {} failed: {}", component, err);
                report(InstallEvent {
                    phase: InstallPhase::Failed,
                    component: Some(component),
                    fraction: None,
                    message: Some(err.to_string()),
                });
                return Err(err);
            }
            installed.push(component);
        }

        report(InstallEvent::phase_only(InstallPhase::Rescanning));
        let after = probe(root)?;

        report(InstallEvent::phase_only(InstallPhase::Done));
        info!("Install run finished, installed {:?}", installed);
        Ok(InstallOutcome {
            installed,
            skipped,
            probe: after,
        })
    }

    async fn install_component(
        &self,
        component: Component,
        root: &Path,
        staging: &StagingArea,
        report: EventSink<'_>,
    ) -> ManagerResult<()> {
        report(InstallEvent::for_component(InstallPhase::Fetching, component));
        let archive = self
            .fetcher
            .fetch_component(component, self.policy, &|progress| {
                report(InstallEvent {
                    phase: InstallPhase::Fetching,
                    component: Some(component),
                    fraction: progress.fraction(),
                    message: None,
                });
            })
            .await?;

        report(InstallEvent::for_component(
            InstallPhase::Extracting,
            component,
        ));
        let staged = staging.dir_for(component);
        extract(&archive, &staged)?;

        report(InstallEvent::for_component(InstallPhase::Merging, component));
        merge(&staged, root, component.destination_subpath())?;

        info!("{} merged into {:?}", component, root);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ManagerError;
    use crate::core::http::build_http_client;

    fn zip_with(entries: &[(&str, &[u8])]) -> Vec<u8> {
        use std::io::Write;
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, bytes) in entries {
            writer
                .start_file(*name, zip::write::SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(bytes).expect("write entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    /// Serves BepInEx, fails MonoMod, and must never be asked for the
    /// Modding API.
    struct SplitFetcher;

    #[async_trait]
    impl ComponentFetch for SplitFetcher {
        async fn fetch_component(
            &self,
            component: Component,
            _policy: ReleasePolicy,
            _on_progress: ProgressSink<'_>,
        ) -> ManagerResult<Vec<u8>> {
            match component {
                Component::RuntimePatcher => {
                    Ok(zip_with(&[("BepInEx/core/BepInEx.dll", b"dll bytes")]))
                }
                Component::PatchFramework => Err(ManagerError::Remote {
                    url: "https://example.invalid/monomod.zip".into(),
                    status: 502,
                }),
                Component::ModdingApi => panic!("fetched past a failed component"),
            }
        }
    }

    #[tokio::test]
    async fn refuses_to_plan_against_an_invalid_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let orchestrator =
            Orchestrator::new(build_http_client().expect("client"), ReleasePolicy::Pinned);

        let err = orchestrator
            .run(dir.path(), &|_event| {})
            .await
            .expect_err("must refuse");
        assert!(matches!(err, ManagerError::InvalidTarget { .. }));
    }

    #[tokio::test]
    async fn fully_installed_target_fetches_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("hollow_knight.exe"), b"").expect("marker");
        std::fs::create_dir_all(dir.path().join("BepInEx/core")).expect("bepinex");
        std::fs::create_dir_all(dir.path().join("BepInEx/MonoMod")).expect("monomod");
        std::fs::create_dir_all(dir.path().join("hollow_knight_Data/Managed/Mods"))
            .expect("api");

        let orchestrator =
            Orchestrator::new(build_http_client().expect("client"), ReleasePolicy::Pinned);

        // No missing components, so the run completes without touching the
        // network at all.
        let outcome = orchestrator
            .run(dir.path(), &|_event| {})
            .await
            .expect("run");
        assert!(outcome.installed.is_empty());
        assert_eq!(outcome.skipped, Component::INSTALL_ORDER.to_vec());
        assert_eq!(outcome.probe.missing(), Vec::<Component>::new());
    }

    #[tokio::test]
    async fn failed_fetch_halts_the_plan_and_keeps_earlier_merges() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("hollow_knight.exe"), b"").expect("marker");

        let orchestrator = Orchestrator::with_fetcher(SplitFetcher, ReleasePolicy::Pinned);
        let events = std::sync::Mutex::new(Vec::new());
        let sink = |event: InstallEvent| {
            events.lock().expect("events lock").push(event);
        };

        let err = orchestrator
            .run(dir.path(), &sink)
            .await
            .expect_err("must halt");
        assert!(matches!(err, ManagerError::Remote { status: 502, .. }));

        // The component merged before the failure stays in place.
        assert!(dir.path().join("BepInEx/core/BepInEx.dll").exists());

        let failed = events
            .lock()
            .expect("events lock")
            .iter()
            .find(|event| event.phase == InstallPhase::Failed)
            .cloned()
            .expect("failed event");
        assert_eq!(failed.component, Some(Component::PatchFramework));
        assert!(failed.message.is_some());

        // A retry plans only the components that never landed.
        let after = probe(dir.path()).expect("probe");
        assert_eq!(
            after.missing(),
            vec![Component::PatchFramework, Component::ModdingApi]
        );
    }
}
