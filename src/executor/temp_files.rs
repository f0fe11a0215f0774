//! Files the steps create in the job workspace
//!
//! Each run gets:
//!
//! - `jcl<uuid>.txt` - the JCL handed to the CLI, removed when the
//!   [`JclFile`] guard is dropped
//! - `TopazCliWkspc<uuid>/` - the CLI data directory, removed only after a
//!   successful run

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Prefix of the per-run CLI data directory
pub const TOPAZ_CLI_WORKSPACE: &str = "TopazCliWkspc";

/// Workspace of one job
///
/// # Example
///
/// ```rust
/// use zadviser::WorkspaceFiles;
/// use tempfile::TempDir;
///
/// let temp_dir = TempDir::new().unwrap();
/// let files = WorkspaceFiles::new(temp_dir.path()).unwrap();
///
/// let jcl = files.create_jcl_file("//ZADVISER JOB").unwrap();
/// let path = jcl.path().to_path_buf();
/// assert!(path.exists());
///
/// drop(jcl);
/// assert!(!path.exists());
/// ```
#[derive(Debug, Clone)]
pub struct WorkspaceFiles {
    workspace: PathBuf,
}

impl WorkspaceFiles {
    /// Opens the workspace, creating it if needed
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the directory cannot be created
    pub fn new(workspace: impl Into<PathBuf>) -> io::Result<Self> {
        let workspace = workspace.into();
        fs::create_dir_all(&workspace)?;
        Ok(Self { workspace })
    }

    /// Workspace root
    #[must_use]
    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Data directory for the given run id
    #[must_use]
    pub fn data_dir(&self, id: Uuid) -> PathBuf {
        self.workspace.join(format!("{TOPAZ_CLI_WORKSPACE}{id}"))
    }

    /// Data directory for a fresh run id
    #[must_use]
    pub fn new_data_dir(&self) -> PathBuf {
        self.data_dir(Uuid::new_v4())
    }

    /// Writes the JCL to a uniquely named file
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the file cannot be written
    pub fn create_jcl_file(&self, jcl: &str) -> io::Result<JclFile> {
        let path = self.workspace.join(format!("jcl{}.txt", Uuid::new_v4()));
        fs::write(&path, jcl)?;
        tracing::debug!(path = %path.display(), "Wrote JCL file");
        Ok(JclFile { path })
    }

    /// Removes a run's data directory
    ///
    /// Returns `false` when there was nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns `std::io::Error` if the directory exists but cannot be removed
    pub fn remove_data_dir(&self, data_dir: &Path) -> io::Result<bool> {
        match fs::remove_dir_all(data_dir) {
            Ok(()) => {
                tracing::debug!(path = %data_dir.display(), "Removed CLI data directory");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// JCL file deleted on drop
#[derive(Debug)]
pub struct JclFile {
    path: PathBuf,
}

impl JclFile {
    /// Location of the file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for JclFile {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed JCL file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove JCL file");
            }
        }
    }
}
