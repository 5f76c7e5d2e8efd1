pub mod component;
pub mod extract;
pub mod fetch;
pub mod merge;
pub mod orchestrator;
pub mod probe;
pub mod staging;

pub use component::{Component, ReleasePolicy};
pub use orchestrator::{ComponentFetch, InstallEvent, InstallOutcome, Orchestrator};
pub use probe::{probe, ProbeResult};
