//! Bridge build fingerprinting.
//!
//! A fingerprint captures every input of the native bridge build, allowing
//! `setup` to skip `make` when nothing has changed.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::flags::FlagSet;
use crate::util::fs::{read_to_string, write_string};
use crate::util::hash::{sha256_file, Fingerprint as HashFingerprint};

/// File the fingerprint is stored in, inside the output directory.
pub const FINGERPRINT_FILE: &str = ".bridge-fingerprint.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeFingerprint {
    /// Hash of all four flag strings
    pub flags_hash: String,

    /// Source hashes by file name
    pub source_hashes: BTreeMap<String, String>,
}

impl BridgeFingerprint {
    /// Fingerprint `flags` and the given source files.
    pub fn compute(flags: &FlagSet, sources: &[impl AsRef<Path>]) -> Result<Self> {
        let mut fp = HashFingerprint::new();
        fp.update_strs([
            flags.include_flags.as_str(),
            flags.link_flags.as_str(),
            flags.cxxflags.as_str(),
            flags.cppflags.as_str(),
        ]);
        let flags_hash = fp.finish_short();

        let mut source_hashes = BTreeMap::new();
        for source in sources {
            let source = source.as_ref();
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| source.display().to_string());
            source_hashes.insert(name, sha256_file(source)?);
        }

        Ok(BridgeFingerprint {
            flags_hash,
            source_hashes,
        })
    }

    /// The stored fingerprint, or `None` when there is none yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(fp) => Ok(Some(fp)),
            Err(e) => {
                tracing::warn!("ignoring unreadable fingerprint {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_string(path, &content)
    }

    /// Check if the fingerprint matches (nothing has changed).
    pub fn matches(&self, other: &BridgeFingerprint) -> bool {
        self.flags_hash == other.flags_hash && self.source_hashes == other.source_hashes
    }
}
