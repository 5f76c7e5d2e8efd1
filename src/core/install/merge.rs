use std::path::Path;

use tracing::debug;

use crate::core::error::{ManagerError, ManagerResult};

/// Copy a staged extraction tree into the live install directory.
///
/// For every top-level entry of `staged_tree`: a directory replaces any
/// existing directory of the same name wholesale (delete, then copy), a
/// file overwrites in place. This is not a three-way merge; components
/// that must coexist with foreign files under a shared folder name get a
/// unique `destination_subpath` instead.
///
/// Not atomic. An interrupted merge leaves a mix of old and new files,
/// which is acceptable because rerunning the same merge converges to the
/// same end state.
pub fn merge(
    staged_tree: &Path,
    destination_root: &Path,
    destination_subpath: &str,
) -> ManagerResult<()> {
    let destination = if destination_subpath.is_empty() {
        destination_root.to_path_buf()
    } else {
        destination_root.join(destination_subpath)
    };

    std::fs::create_dir_all(&destination).map_err(|source| ManagerError::Io {
        path: destination.clone(),
        source,
    })?;

    for entry in read_dir(staged_tree)? {
        let entry = entry.map_err(|source| ManagerError::Io {
            path: staged_tree.to_path_buf(),
            source,
        })?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(|source| ManagerError::Io {
            path: src_path.clone(),
            source,
        })?;

        if file_type.is_dir() {
            if dst_path.exists() {
                std::fs::remove_dir_all(&dst_path).map_err(|source| ManagerError::Io {
                    path: dst_path.clone(),
                    source,
                })?;
            }
            copy_dir_recursive(&src_path, &dst_path)?;
            debug!("merged directory {:?}", entry.file_name());
        } else if file_type.is_file() {
            std::fs::copy(&src_path, &dst_path).map_err(|source| ManagerError::Io {
                path: dst_path.clone(),
                source,
            })?;
            debug!("merged file {:?}", entry.file_name());
        }
    }

    Ok(())
}

fn read_dir(path: &Path) -> ManagerResult<std::fs::ReadDir> {
    std::fs::read_dir(path).map_err(|source| ManagerError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn copy_dir_recursive(source: &Path, destination: &Path) -> ManagerResult<()> {
    std::fs::create_dir_all(destination).map_err(|source_err| ManagerError::Io {
        path: destination.to_path_buf(),
        source: source_err,
    })?;

    for entry in read_dir(source)? {
        let entry = entry.map_err(|source_err| ManagerError::Io {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry.file_type().map_err(|source_err| ManagerError::Io {
            path: src_path.clone(),
            source: source_err,
        })?;

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            std::fs::copy(&src_path, &dst_path).map_err(|source_err| ManagerError::Io {
                path: dst_path,
                source: source_err,
            })?;
        }
    }

    Ok(())
}
