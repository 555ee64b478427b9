use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use launchpad_common::{Error, Result};
use regex::Regex;
use tracing::{info, warn};

use crate::descriptor::Descriptor;

/// Descriptors written into a freshly created source directory.
const SEEDS: &[(&str, &str)] = &[
    (
        "001_create_users_table.sql",
        include_str!("../seeds/001_create_users_table.sql"),
    ),
    (
        "002_add_user_roles.sql",
        include_str!("../seeds/002_add_user_roles.sql"),
    ),
];

static NUMERIC_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+_").unwrap_or_else(|e| panic!("invalid prefix pattern: {e}"))
});

/// The directory migration descriptors are discovered in.
#[derive(Debug, Clone)]
pub struct SourceDirectory {
    path: PathBuf,
}

impl SourceDirectory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the directory and write the seed descriptors, but only if the
    /// directory does not exist yet. Returns `true` when it bootstrapped.
    pub fn ensure(&self) -> Result<bool> {
        if self.path.exists() {
            return Ok(false);
        }

        fs::create_dir_all(&self.path)?;
        for (name, content) in SEEDS {
            fs::write(self.path.join(name), content)?;
        }
        info!(
            "created {} with {} example migrations",
            self.path.display(),
            SEEDS.len()
        );
        Ok(true)
    }

    /// List recognized descriptors sorted by id. Never touches the
    /// filesystem beyond reading; a missing directory yields nothing.
    pub fn discover(&self) -> Result<Vec<Descriptor>> {
        let entries = match fs::read_dir(&self.path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(Error::Io(e));
            }
        };

        let mut descriptors = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                warn!(
                    "skipping non UTF-8 file name in {}: {:?}",
                    self.path.display(),
                    entry.file_name()
                );
                continue;
            };
            if let Some(descriptor) = Descriptor::from_dir_entry(&self.path, &name) {
                descriptors.push(descriptor);
            }
        }

        descriptors.sort_by(|a, b| a.id.cmp(&b.id));

        for d in descriptors.iter().filter(|d| !NUMERIC_PREFIX.is_match(&d.id)) {
            warn!(
                "migration {} has no numeric prefix; it runs in plain lexicographic order",
                d.id
            );
        }

        Ok(descriptors)
    }
}
