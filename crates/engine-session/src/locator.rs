//! Engine binary discovery.
//!
//! Resolution order for each engine kind:
//!
//! 1. The configured path, if any. An invalid configured path is an error;
//!    there is no fallback to the other locations.
//! 2. Conventional install locations, in order.
//! 3. Directories on the executable search path.
//!
//! The locator only inspects the filesystem; it never launches anything.

use crate::EngineKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum LocateError {
    /// A path was configured but does not point at an executable file.
    #[error("Configured {kind} engine path not found or not executable: {}", path.display())]
    ConfiguredPathNotFound { kind: EngineKind, path: PathBuf },
}

/// Finds engine executables.
#[derive(Debug, Clone, Default)]
pub struct Locator {
    strong_candidates: Vec<PathBuf>,
    human_like_candidates: Vec<PathBuf>,
    search_path: Vec<PathBuf>,
}

impl Locator {
    /// A locator with explicit candidate lists, for hosts with unusual layouts.
    pub fn new(
        strong_candidates: Vec<PathBuf>,
        human_like_candidates: Vec<PathBuf>,
        search_path: Vec<PathBuf>,
    ) -> Self {
        Self {
            strong_candidates,
            human_like_candidates,
            search_path,
        }
    }

    /// Platform-conventional locations plus the `PATH` of this process.
    pub fn system() -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|paths| std::env::split_paths(&paths).collect())
            .unwrap_or_default();

        Self::new(
            to_paths(&[
                "/usr/local/bin/stockfish",
                "/usr/bin/stockfish",
                "/usr/games/stockfish",
                "/opt/homebrew/bin/stockfish",
                "C:\\Program Files\\Stockfish\\stockfish.exe",
            ]),
            to_paths(&[
                "/usr/local/bin/maia",
                "/usr/bin/maia",
                "/opt/maia/maia",
                "/opt/homebrew/bin/maia",
            ]),
            search_path,
        )
    }

    /// Program names looked up on the search path.
    fn program_names(kind: EngineKind) -> &'static [&'static str] {
        match kind {
            EngineKind::Strong => &["stockfish"],
            EngineKind::HumanLike => &["maia"],
        }
    }

    fn candidates(&self, kind: EngineKind) -> &[PathBuf] {
        match kind {
            EngineKind::Strong => &self.strong_candidates,
            EngineKind::HumanLike => &self.human_like_candidates,
        }
    }

    /// Resolve the executable for `kind`.
    ///
    /// Returns `Ok(None)` when nothing was configured and nothing was found.
    pub fn locate(
        &self,
        kind: EngineKind,
        configured: Option<&Path>,
    ) -> Result<Option<PathBuf>, LocateError> {
        if let Some(path) = configured {
            return self
                .resolve_configured(path)
                .map(Some)
                .ok_or_else(|| LocateError::ConfiguredPathNotFound {
                    kind,
                    path: path.to_path_buf(),
                });
        }

        if let Some(found) = self.candidates(kind).iter().find(|p| is_executable(p)) {
            return Ok(Some(found.clone()));
        }

        Ok(Self::program_names(kind)
            .iter()
            .find_map(|name| self.search(name)))
    }

    /// A bare program name ("stockfish") is looked up on the search path;
    /// anything with a directory component must exist as given.
    fn resolve_configured(&self, path: &Path) -> Option<PathBuf> {
        let is_bare = path.components().count() == 1 && !path.is_absolute();
        if is_bare && !is_executable(path) {
            return path.to_str().and_then(|name| self.search(name));
        }
        is_executable(path).then(|| path.to_path_buf())
    }

    fn search(&self, name: &str) -> Option<PathBuf> {
        let file_name = format!("{}{}", name, std::env::consts::EXE_SUFFIX);
        self.search_path
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| is_executable(candidate))
    }
}

fn to_paths(paths: &[&str]) -> Vec<PathBuf> {
    paths.iter().map(PathBuf::from).collect()
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn write_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_configured_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let configured = write_file(dir.path(), "my-stockfish", 0o755);
        let conventional = write_file(dir.path(), "stockfish", 0o755);
        let locator = Locator::new(vec![conventional], vec![], vec![]);

        let found = locator.locate(EngineKind::Strong, Some(&configured)).unwrap();
        assert_eq!(found, Some(configured));
    }

    #[test]
    fn test_invalid_configured_path_does_not_fall_back() {
        let dir = tempfile::tempdir().unwrap();
        let conventional = write_file(dir.path(), "stockfish", 0o755);
        let locator = Locator::new(vec![conventional], vec![], vec![dir.path().to_path_buf()]);
        let missing = dir.path().join("nope").join("stockfish");

        let result = locator.locate(EngineKind::Strong, Some(&missing));
        assert_eq!(
            result,
            Err(LocateError::ConfiguredPathNotFound {
                kind: EngineKind::Strong,
                path: missing,
            })
        );
    }

    #[test]
    fn test_non_executable_configured_path_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let plain = write_file(dir.path(), "stockfish", 0o644);
        let locator = Locator::default();

        assert!(locator.locate(EngineKind::Strong, Some(&plain)).is_err());
    }

    #[test]
    fn test_conventional_locations_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let skipped = write_file(dir.path(), "first", 0o644);
        let second = write_file(dir.path(), "second", 0o755);
        let third = write_file(dir.path(), "third", 0o755);
        let locator = Locator::new(vec![], vec![skipped, second.clone(), third], vec![]);

        assert_eq!(
            locator.locate(EngineKind::HumanLike, None).unwrap(),
            Some(second)
        );
        assert_eq!(locator.locate(EngineKind::Strong, None).unwrap(), None);
    }

    #[test]
    fn test_search_path_fallback() {
        let empty = tempfile::tempdir().unwrap();
        let bin = tempfile::tempdir().unwrap();
        let stockfish = write_file(bin.path(), "stockfish", 0o755);
        let locator = Locator::new(
            vec![empty.path().join("stockfish")],
            vec![],
            vec![empty.path().to_path_buf(), bin.path().to_path_buf()],
        );

        assert_eq!(
            locator.locate(EngineKind::Strong, None).unwrap(),
            Some(stockfish)
        );
        assert_eq!(locator.locate(EngineKind::HumanLike, None).unwrap(), None);
    }

    #[test]
    fn test_bare_configured_name_uses_search_path() {
        let bin = tempfile::tempdir().unwrap();
        let engine = write_file(bin.path(), "maia", 0o755);
        let locator = Locator::new(vec![], vec![], vec![bin.path().to_path_buf()]);

        assert_eq!(
            locator
                .locate(EngineKind::HumanLike, Some(Path::new("maia")))
                .unwrap(),
            Some(engine)
        );
        assert!(locator
            .locate(EngineKind::HumanLike, Some(Path::new("lc0")))
            .is_err());
    }

    #[test]
    fn test_directories_are_not_executables() {
        let dir = tempfile::tempdir().unwrap();
        let locator = Locator::new(vec![dir.path().to_path_buf()], vec![], vec![]);
        assert_eq!(locator.locate(EngineKind::Strong, None).unwrap(), None);
    }
}
