use std::io::Cursor;
use std::path::Path;

use tracing::debug;
use zip::ZipArchive;

use crate::core::error::{ManagerError, ManagerResult};

/// Unpack a zip archive into `destination`.
///
/// The central directory must parse before anything touches the
/// filesystem; a malformed archive fails with `CorruptArchive` and leaves
/// `destination` absent. A failure after extraction starts is reported as
/// `Extraction` and the caller discards the partial tree (it only ever
/// lives in a staging area, never in the game directory).
pub fn extract(archive: &[u8], destination: &Path) -> ManagerResult<()> {
    let mut zip = ZipArchive::new(Cursor::new(archive))
        .map_err(|err| ManagerError::CorruptArchive(err.to_string()))?;

    std::fs::create_dir_all(destination).map_err(|source| ManagerError::Io {
        path: destination.to_path_buf(),
        source,
    })?;

    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|err| ManagerError::Extraction(err.to_string()))?;

        // enclosed_name rejects absolute paths and `..` traversal.
        let Some(relative) = entry.enclosed_name() else {
            return Err(ManagerError::Extraction(format!(
                "unsafe entry path {:?}",
                entry.name()
            )));
        };
        let out_path = destination.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|source| ManagerError::Io {
                path: out_path,
                source,
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ManagerError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut out = std::fs::File::create(&out_path).map_err(|source| ManagerError::Io {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|err| ManagerError::Extraction(format!("{}: {err}", out_path.display())))?;
    }

    debug!("Extracted {} entries into {:?}", zip.len(), destination);
    Ok(())
}
