use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use super::component::Component;
use crate::core::error::{ManagerError, ManagerResult};

/// Ephemeral extraction area for one install run, one subdirectory per
/// component. Owned exclusively by that run and removed best-effort when
/// it ends; leftovers under the OS temp dir are harmless.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
}

impl StagingArea {
    pub fn create() -> ManagerResult<Self> {
        let root = std::env::temp_dir().join(format!("hornet-mm-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&root).map_err(|source| ManagerError::Io {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn dir_for(&self, component: Component) -> PathBuf {
        self.root.join(component.display_name().replace(' ', "_"))
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if let Err(source) = std::fs::remove_dir_all(&self.root) {
            if source.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to clean staging area {:?}: {}", self.root, source);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staging_dirs_are_distinct_per_component() {
        let staging = StagingArea::create().expect("staging");
        let dirs: Vec<PathBuf> = Component::INSTALL_ORDER
            .into_iter()
            .map(|component| staging.dir_for(component))
            .collect();
        assert_eq!(dirs.len(), 3);
        assert!(dirs.iter().all(|dir| dir.starts_with(staging.path())));
        assert!(dirs.windows(2).all(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn drop_removes_the_staging_root() {
        let staging = StagingArea::create().expect("staging");
        let root = staging.path().to_path_buf();
        std::fs::create_dir_all(staging.dir_for(Component::RuntimePatcher)).expect("subdir");
        drop(staging);
        assert!(!root.exists());
    }
}
