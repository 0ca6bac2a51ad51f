//! File system utilities for the pipeline.
//!
//! Idempotent removal, directory moves with a cross-device fallback, and
//! symlink-preserving recursive copies.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Outcome of an ensure-absent operation.
#[derive(Debug)]
pub enum EnsureAbsent {
    /// The path existed and was removed.
    Removed,
    /// Nothing was there.
    AlreadyAbsent,
    /// Removal was attempted and failed.
    Failed(io::Error),
}

impl EnsureAbsent {
    /// Converts a failure into an error carrying `path`.
    pub fn into_result(self, path: &Path) -> Result<bool> {
        match self {
            EnsureAbsent::Removed => Ok(true),
            EnsureAbsent::AlreadyAbsent => Ok(false),
            EnsureAbsent::Failed(source) => Err(Error::Fs {
                context: "removing".into(),
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Removes a file, directory tree or symlink at `path` if present.
pub async fn ensure_absent(path: &Path) -> EnsureAbsent {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return EnsureAbsent::AlreadyAbsent,
        Err(e) => return EnsureAbsent::Failed(e),
    };

    let removal = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match removal {
        Ok(()) => EnsureAbsent::Removed,
        // Raced with another remover.
        Err(e) if e.kind() == io::ErrorKind::NotFound => EnsureAbsent::AlreadyAbsent,
        Err(e) => EnsureAbsent::Failed(e),
    }
}

/// Creates all of the directories of the specified path, erasing it first if specified.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        ensure_absent(path).await.into_result(path)?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Moves a directory tree to `to`, which must not exist.
///
/// Tries a rename first and falls back to copy-then-delete when source and
/// destination are on different filesystems.
pub async fn move_dir(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating destination parent", parent)?;
    }

    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            log::debug!(
                "rename across devices, copying {} -> {}",
                from.display(),
                to.display()
            );
            copy_dir(from, to).await?;
            ensure_absent(from).await.into_result(from)?;
            Ok(())
        }
        Err(e) => Err(e).fs_context("moving bundle", from),
    }
}

/// Makes a symbolic link.
#[cfg(unix)]
fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(src, dst)
}

#[cfg(windows)]
fn symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        std::os::windows::fs::symlink_dir(src, dst)
    } else {
        std::os::windows::fs::symlink_file(src, dst)
    }
}

/// Recursively copies a directory from one path to another, creating any
/// parent directories of the destination path as necessary.
///
/// Preserves symlinks, which frozen bundles rely on for their framework
/// layout. Fails if the source path is not a directory.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!("{from:?} is not a directory")));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).fs_context("creating destination parent", parent)?;
        }

        for entry in walkdir::WalkDir::new(&from) {
            let entry = entry.map_err(|e| Error::GenericError(format!("walking {from:?}: {e}")))?;
            let rel_path = entry
                .path()
                .strip_prefix(&from)
                .map_err(|e| Error::GenericError(e.to_string()))?;
            let dest_path = to.join(rel_path);

            if entry.file_type().is_symlink() {
                let target = std::fs::read_link(entry.path())
                    .fs_context("reading symlink", entry.path())?;
                symlink(&target, &dest_path).fs_context("creating symlink", &dest_path)?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest_path).fs_context("creating directory", &dest_path)?;
            } else {
                std::fs::copy(entry.path(), &dest_path).fs_context("copying file", entry.path())?;
            }
        }

        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("Directory copy task panicked: {e}")))?
}

/// Total size in bytes of a file or directory tree, not following symlinks.
pub fn tree_size(path: &Path) -> u64 {
    walkdir::WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter_map(|e| e.metadata().ok())
        .filter(|m| m.is_file())
        .map(|m| m.len())
        .sum()
}

/// Human-readable byte count, e.g. `142.3 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Lexically resolves `.` and `..` components without touching the disk.
///
/// `..` above the root is dropped, so the result never escapes `/`.
pub fn normalize(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Lists the paths below `root` whose file name matches `predicate`,
/// without descending into directories named in `skip` or into matches.
pub fn find_matching<F>(root: &Path, skip: &[PathBuf], predicate: F) -> Vec<PathBuf>
where
    F: Fn(&walkdir::DirEntry) -> bool,
{
    let mut found = Vec::new();
    let mut walker = walkdir::WalkDir::new(root).min_depth(1).into_iter();

    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else { continue };
        if skip.iter().any(|s| s == entry.path()) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }
        if predicate(&entry) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            found.push(entry.into_path());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_resolves_dot_components() {
        assert_eq!(normalize(Path::new("/work/.")), PathBuf::from("/work"));
        assert_eq!(normalize(Path::new("/work/")), PathBuf::from("/work"));
        assert_eq!(normalize(Path::new("/work/dist/..")), PathBuf::from("/work"));
        assert_eq!(normalize(Path::new("/work/../..")), PathBuf::from("/"));
        assert_eq!(
            normalize(Path::new("/work/./build/../dist")),
            PathBuf::from("/work/dist")
        );
    }

    #[tokio::test]
    async fn ensure_absent_is_tri_state() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("build");
        std::fs::create_dir_all(target.join("nested")).unwrap();
        std::fs::write(target.join("nested/file"), b"x").unwrap();

        assert!(matches!(ensure_absent(&target).await, EnsureAbsent::Removed));
        assert!(!target.exists());
        assert!(matches!(
            ensure_absent(&target).await,
            EnsureAbsent::AlreadyAbsent
        ));

        let file = dir.path().join("x.log");
        std::fs::write(&file, b"log").unwrap();
        assert!(matches!(ensure_absent(&file).await, EnsureAbsent::Removed));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn copy_dir_preserves_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("App.app");
        std::fs::create_dir_all(src.join("Contents/Frameworks/Python.framework/Versions/3.11")).unwrap();
        std::fs::write(
            src.join("Contents/Frameworks/Python.framework/Versions/3.11/Python"),
            b"lib",
        )
        .unwrap();
        std::os::unix::fs::symlink(
            "Versions/3.11/Python",
            src.join("Contents/Frameworks/Python.framework/Python"),
        )
        .unwrap();

        let dst = dir.path().join("staging/App.app");
        copy_dir(&src, &dst).await.unwrap();

        let link = dst.join("Contents/Frameworks/Python.framework/Python");
        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read(&link).unwrap(), b"lib");
    }

    #[tokio::test]
    async fn move_dir_relocates_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("build/dist-arm64/App.app");
        std::fs::create_dir_all(src.join("Contents/MacOS")).unwrap();
        std::fs::write(src.join("Contents/MacOS/App"), b"bin").unwrap();

        let dst = dir.path().join("dist/App-AppleSilicon.app");
        move_dir(&src, &dst).await.unwrap();

        assert!(!src.exists());
        assert_eq!(std::fs::read(dst.join("Contents/MacOS/App")).unwrap(), b"bin");
    }

    #[test]
    fn sizes_render_readably() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn find_matching_skips_excluded_trees() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("utils/__pycache__")).unwrap();
        std::fs::create_dir_all(dir.path().join("venv-arm64/lib/__pycache__")).unwrap();

        let found = find_matching(dir.path(), &[dir.path().join("venv-arm64")], |e| {
            e.file_name() == "__pycache__"
        });

        assert_eq!(found, vec![dir.path().join("utils/__pycache__")]);
    }
}
