use std::ffi::OsString;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use launchpad_common::{Error, Result};
use tracing::{debug, warn};

/// Handle to the executed-migrations ledger: a UTF-8 text file with one
/// descriptor id per line.
///
/// The file is created lazily by the first [`Ledger::record`]. Every record
/// re-reads the file, appends in memory and replaces the file in full.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Executed ids in recorded order. An absent file is an empty ledger.
    pub fn load(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(parse(&contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) if e.kind() == ErrorKind::InvalidData => Err(Error::Ledger(format!(
                "{} is not valid UTF-8",
                self.path.display()
            ))),
            Err(e) => Err(Error::Ledger(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Append `id` and rewrite the ledger.
    pub fn record(&self, id: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.push(id.to_string());
        self.write_all(&entries)?;
        debug!("recorded {id} in {}", self.path.display());
        Ok(())
    }

    fn ensure_parent(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
                .map_err(|e| Error::Ledger(format!("failed to create {}: {e}", parent.display()))),
            _ => Ok(()),
        }
    }

    fn write_all(&self, entries: &[String]) -> Result<()> {
        self.ensure_parent()?;

        // Readers only ever see the old or the new ledger, never a partial write.
        let tmp = with_suffix(&self.path, ".tmp");
        fs::write(&tmp, entries.join("\n"))
            .map_err(|e| Error::Ledger(format!("failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            Error::Ledger(format!(
                "failed to replace {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Take the advisory lock guarding this ledger.
    pub fn lock(&self) -> Result<LedgerLock> {
        self.ensure_parent()?;
        LedgerLock::acquire(with_suffix(&self.path, ".lock"))
    }
}

/// Exclusive lock file held for the duration of a run. Removed on drop.
#[derive(Debug)]
pub struct LedgerLock {
    path: PathBuf,
}

impl LedgerLock {
    fn acquire(path: PathBuf) -> Result<Self> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(Error::Locked(path)),
            Err(e) => {
                return Err(Error::Ledger(format!(
                    "failed to create lock {}: {e}",
                    path.display()
                )));
            }
        };
        // pid for whoever has to clear a stale lock
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            warn!("failed to write pid to ledger lock {}: {e}", path.display());
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("failed to release ledger lock {}: {e}", self.path.display());
        }
    }
}

fn parse(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("ledger"));
    name.push(suffix);
    path.with_file_name(name)
}
