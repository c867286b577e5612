use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rnaview_core::{DownloadError, DownloadFile, DownloadHost};
use tracing::{debug, warn};

/// Saves downloads into a directory. The "object url" is a staged
/// `.part` file that is renamed into place on trigger and removed on revoke
/// if it is still around.
pub struct DirectoryDownloads {
    dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Vec::new(),
        }
    }

    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl DownloadHost for DirectoryDownloads {
    type Handle = PathBuf;

    fn create_object_url(&mut self, file: &DownloadFile) -> Result<PathBuf, DownloadError> {
        let staged = self.dir.join(format!(".{}.part", file.file_name));
        fs::write(&staged, &file.bytes).map_err(|e| host_err(&staged, e))?;
        debug!(path = %staged.display(), mime = %file.mime, "staged download");
        Ok(staged)
    }

    fn trigger(&mut self, handle: &PathBuf, file_name: &str) -> Result<(), DownloadError> {
        let target = self.dir.join(file_name);
        fs::rename(handle, &target).map_err(|e| host_err(&target, e))?;
        self.saved.push(target);
        Ok(())
    }

    fn revoke(&mut self, handle: PathBuf) {
        match fs::remove_file(&handle) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %handle.display(), error = %e, "could not remove staged download"),
        }
    }
}

fn host_err(path: &Path, e: io::Error) -> DownloadError {
    DownloadError::Host(format!("{}: {e}", path.display()))
}
