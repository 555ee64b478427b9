use std::path::{Path, PathBuf};

use serde::Serialize;

/// How a descriptor is executed, decided once from its file suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    /// Opaque statement text handed to a `StatementSink`.
    Declarative,
    /// WebAssembly module exporting an `up` function.
    Procedural,
}

impl DescriptorKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.ends_with(".sql") {
            Some(Self::Declarative)
        } else if name.ends_with(".wasm") {
            Some(Self::Procedural)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Declarative => "declarative",
            Self::Procedural => "procedural",
        }
    }
}

/// A single migration unit on disk, identified by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub id: String,
    pub path: PathBuf,
    pub kind: DescriptorKind,
}

impl Descriptor {
    /// Build a descriptor for `dir/name`, or `None` if the suffix is not
    /// recognized.
    pub fn from_dir_entry(dir: &Path, name: &str) -> Option<Self> {
        let kind = DescriptorKind::from_file_name(name)?;
        Some(Self {
            id: name.to_string(),
            path: dir.join(name),
            kind,
        })
    }
}
