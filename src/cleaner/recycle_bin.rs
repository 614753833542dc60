//! Gateway over the OS-managed deleted-item store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use walkdir::WalkDir;

use crate::config::RecycleBinConfig;
use crate::error::{JanitorError, Result};

/// Trait for recycle bin backends
pub trait RecycleBinGateway: Send + Sync {
    /// Get the name of this backend
    fn name(&self) -> &'static str;

    /// Query the total size of the store in bytes.
    fn try_query_size(&self) -> Result<u64>;

    /// Silently purge the store. Emptying an empty store succeeds.
    fn empty(&self) -> Result<()>;

    /// Query the size, degrading any failure to zero.
    fn query_size(&self) -> u64 {
        match self.try_query_size() {
            Ok(size) => size,
            Err(e) => {
                tracing::warn!("{} size query failed: {}", self.name(), e);
                0
            }
        }
    }
}

/// Build the native gateway for the current platform.
pub fn default_gateway(config: &RecycleBinConfig) -> Arc<dyn RecycleBinGateway> {
    #[cfg(windows)]
    {
        if config.trash_dir.is_none() {
            return Arc::new(ShellRecycleBin::new(&config.drive));
        }
    }

    match &config.trash_dir {
        Some(dir) => Arc::new(TrashDirGateway::new(dir.clone())),
        None => Arc::new(TrashDirGateway::from_environment()),
    }
}

/// Freedesktop.org trash directory (`files/`, `info/`, `expunged/`).
#[derive(Debug, Clone)]
pub struct TrashDirGateway {
    root: PathBuf,
}

impl TrashDirGateway {
    const SUBDIRS: [&'static str; 3] = ["files", "info", "expunged"];

    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Locate the home trash (`$XDG_DATA_HOME/Trash`).
    pub fn from_environment() -> Self {
        let data_dir = dirs::data_dir().unwrap_or_else(|| PathBuf::from("/tmp"));
        Self::new(data_dir.join("Trash"))
    }

    fn clear_dir(dir: &Path, failures: &mut Vec<String>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) => {
                failures.push(format!("{}: {}", dir.display(), e));
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let removed = match entry.file_type() {
                Ok(ft) if ft.is_dir() => fs::remove_dir_all(&path),
                _ => fs::remove_file(&path),
            };
            if let Err(e) = removed {
                failures.push(format!("{}: {}", path.display(), e));
            }
        }
    }
}

impl RecycleBinGateway for TrashDirGateway {
    fn name(&self) -> &'static str {
        "trash"
    }

    fn try_query_size(&self) -> Result<u64> {
        let files = self.root.join("files");
        if !files.exists() {
            return Ok(0);
        }
        fs::read_dir(&files).map_err(|e| JanitorError::io(&files, e))?;

        let size = WalkDir::new(&files)
            .into_iter()
            .flatten()
            .filter(|e| !e.file_type().is_dir())
            .filter_map(|e| e.metadata().ok())
            .map(|m| m.len())
            .sum();

        tracing::debug!(
            "Trash at {} holds {}",
            self.root.display(),
            humansize::format_size(size, humansize::BINARY)
        );
        Ok(size)
    }

    fn empty(&self) -> Result<()> {
        let mut failures = Vec::new();
        for sub in Self::SUBDIRS {
            Self::clear_dir(&self.root.join(sub), &mut failures);
        }
        let _ = fs::remove_file(self.root.join("directorysizes"));

        match failures.first() {
            None => Ok(()),
            Some(first) => Err(JanitorError::Gateway(format!(
                "{} trash entries could not be removed (first: {})",
                failures.len(),
                first
            ))),
        }
    }
}

#[cfg(windows)]
pub use shell::ShellRecycleBin;

#[cfg(windows)]
mod shell {
    use windows_sys::Win32::UI::Shell::{SHEmptyRecycleBinW, SHQueryRecycleBinW, SHQUERYRBINFO};

    use super::RecycleBinGateway;
    use crate::error::{JanitorError, Result};

    const SHERB_NOCONFIRMATION: u32 = 0x1;
    const SHERB_NOPROGRESSUI: u32 = 0x2;
    const SHERB_NOSOUND: u32 = 0x4;
    // Returned by SHEmptyRecycleBinW when there is nothing to empty
    const E_UNEXPECTED: i32 = 0x8000_FFFF_u32 as i32;

    /// The shell recycle bin of a single drive.
    #[derive(Debug, Clone)]
    pub struct ShellRecycleBin {
        drive: Vec<u16>,
    }

    impl ShellRecycleBin {
        pub fn new(drive: &str) -> Self {
            Self {
                drive: drive.encode_utf16().chain(std::iter::once(0)).collect(),
            }
        }
    }

    impl RecycleBinGateway for ShellRecycleBin {
        fn name(&self) -> &'static str {
            "recycle bin"
        }

        fn try_query_size(&self) -> Result<u64> {
            let mut info = SHQUERYRBINFO {
                cbSize: std::mem::size_of::<SHQUERYRBINFO>() as u32,
                i64Size: 0,
                i64NumItems: 0,
            };
            let hr = unsafe { SHQueryRecycleBinW(self.drive.as_ptr(), &mut info) };
            if hr < 0 {
                return Err(JanitorError::Gateway(format!(
                    "SHQueryRecycleBinW failed: 0x{:08X}",
                    hr
                )));
            }
            Ok(info.i64Size.max(0) as u64)
        }

        fn empty(&self) -> Result<()> {
            let flags = SHERB_NOCONFIRMATION | SHERB_NOPROGRESSUI | SHERB_NOSOUND;
            let hr =
                unsafe { SHEmptyRecycleBinW(std::ptr::null_mut(), self.drive.as_ptr(), flags) };
            if hr < 0 && hr != E_UNEXPECTED {
                return Err(JanitorError::Gateway(format!(
                    "SHEmptyRecycleBinW failed: 0x{:08X}",
                    hr
                )));
            }
            Ok(())
        }
    }
}
