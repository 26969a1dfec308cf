use pmx_core::checklist::{OverlayError, OverlayStore, OVERLAY_KEY};
use std::io::ErrorKind;
use std::path::PathBuf;

/// Overlay kept as a single JSON file, the CLI's stand-in for browser local storage.
#[derive(Debug, Clone)]
pub struct FileOverlayStore {
    path: PathBuf,
}

impl FileOverlayStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from(".pmx").join(format!("{OVERLAY_KEY}.json"))
    }
}

impl OverlayStore for FileOverlayStore {
    fn load(&self) -> Result<Option<String>, OverlayError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, raw: &str) -> Result<(), OverlayError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, raw)?;
        Ok(())
    }
}
