//! Persisted one-shot flags on the filesystem.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("failed to write marker {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// "The ready sequence has been shown once" marker.
#[derive(Debug, Clone)]
pub struct SeenReadyMarker {
    path: PathBuf,
}

impl SeenReadyMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn has_seen(&self) -> bool {
        self.path.exists()
    }

    /// Persist the marker, creating parent directories as needed.
    pub fn mark_seen(&self) -> Result<(), MarkerError> {
        let write_error = |source| MarkerError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }
        std::fs::write(&self.path, b"shown").map_err(write_error)?;
        log::info!("Markers: Ready sequence marked as seen ({})", self.path.display());
        Ok(())
    }
}

/// First run means network provisioning has not completed: either the
/// `netconfigured` marker is absent or no network profile (`*.json`) exists
/// in `network_dir`.
pub fn is_first_run(netconfigured: &Path, network_dir: &Path) -> bool {
    !(netconfigured.exists() && has_network_profile(network_dir))
}

fn has_network_profile(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };
    entries.filter_map(Result::ok).any(|entry| {
        let path = entry.path();
        path.is_file() && path.extension().is_some_and(|ext| ext == "json")
    })
}
