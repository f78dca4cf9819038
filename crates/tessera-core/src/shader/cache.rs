// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The content-hash-keyed shader cache.
//!
//! Two levels: an in-memory map for repeat requests within one device
//! lifetime, and an optional on-disk store so later runs skip
//! cross-compilation entirely. Cache files are named
//! `{shader_name}.{content_hash_hex}.{target_kind}`, so entries built from
//! a previous bytecode version can never collide with current ones.
//!
//! The cache is owned by one device instance; it is not a process-wide
//! singleton, and two devices pointed at different directories never share
//! state.

use crate::api::enums::{BackendKind, ShaderStage};
use crate::api::shader::ResourceBinding;
use crate::error::CompileError;
use crate::shader::{compile, CompiledStage, ShaderArtifact};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One persisted unit of shader compilation work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderCacheEntry {
    /// Hash of the portable bytecode this entry was compiled from.
    pub content_hash: [u8; 32],
    /// The backend representation the artifact targets.
    pub target: BackendKind,
    /// The stage the bytecode was compiled as.
    pub stage: ShaderStage,
    /// Entry point name in the native representation.
    pub entry_point: String,
    /// The native representation.
    pub artifact: ShaderArtifact,
    /// Resource layout extracted at compile time.
    pub reflection: Vec<ResourceBinding>,
}

impl ShaderCacheEntry {
    /// The adapter-facing view of this entry.
    pub fn as_stage(&self) -> CompiledStage {
        CompiledStage {
            entry_point: self.entry_point.clone(),
            artifact: self.artifact.clone(),
            reflection: self.reflection.clone(),
        }
    }
}

/// Hit/miss counters, exposed for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Requests answered from the in-memory map.
    pub memory_hits: u64,
    /// Requests answered by loading a cache file.
    pub disk_hits: u64,
    /// Requests that had to cross-compile.
    pub cross_compiles: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    name: String,
    hash: [u8; 32],
    target: BackendKind,
}

/// The two-level shader cache. See the module docs for the contract.
#[derive(Debug)]
pub struct ShaderCache {
    dir: Option<PathBuf>,
    entries: HashMap<CacheKey, Arc<ShaderCacheEntry>>,
    stats: CacheStats,
}

impl ShaderCache {
    /// A cache without disk persistence.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    /// A cache persisting to `dir`, created if missing.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Result<Self, CompileError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| CompileError::Cache {
            path: dir.display().to_string(),
            details: e.to_string(),
        })?;
        log::info!("shader cache directory: {}", dir.display());
        Ok(Self {
            dir: Some(dir),
            entries: HashMap::new(),
            stats: CacheStats::default(),
        })
    }

    /// The file name an entry persists under.
    pub fn file_name(name: &str, hash: &[u8; 32], target: BackendKind) -> String {
        format!(
            "{}.{}.{}",
            sanitize(name),
            compile::hash_hex(hash),
            target.as_str()
        )
    }

    /// Returns the cached compilation of `bytecode` for `target`, compiling
    /// and persisting it first if neither cache level has it.
    pub fn get_or_compile(
        &mut self,
        name: &str,
        bytecode: &[u8],
        stage: ShaderStage,
        target: BackendKind,
    ) -> Result<Arc<ShaderCacheEntry>, CompileError> {
        let hash = compile::content_hash(bytecode);
        let key = CacheKey {
            name: name.to_string(),
            hash,
            target,
        };

        if let Some(entry) = self.entries.get(&key) {
            self.stats.memory_hits += 1;
            return Ok(entry.clone());
        }

        if let Some(path) = self.entry_path(name, &hash, target) {
            if let Some(entry) = load_entry(&path, &hash) {
                log::debug!("shader cache disk hit: {}", path.display());
                self.stats.disk_hits += 1;
                let entry = Arc::new(entry);
                self.entries.insert(key, entry.clone());
                return Ok(entry);
            }
        }

        let compiled = compile::compile(name, bytecode, stage, target)?;
        self.stats.cross_compiles += 1;
        let entry = Arc::new(ShaderCacheEntry {
            content_hash: hash,
            target,
            stage,
            entry_point: compiled.entry_point,
            artifact: compiled.artifact,
            reflection: compiled.reflection,
        });

        if let Some(path) = self.entry_path(name, &hash, target) {
            store_entry(&path, &entry)?;
        }

        self.entries.insert(key, entry.clone());
        Ok(entry)
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// The directory entries persist to, if any.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    fn entry_path(&self, name: &str, hash: &[u8; 32], target: BackendKind) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(Self::file_name(name, hash, target)))
    }
}

/// Loads and verifies a cache file; any mismatch or decode failure is
/// treated as a miss so a corrupt file gets rewritten, not trusted.
fn load_entry(path: &Path, expected_hash: &[u8; 32]) -> Option<ShaderCacheEntry> {
    let bytes = fs::read(path).ok()?;
    let (entry, _): (ShaderCacheEntry, usize) =
        match bincode::serde::decode_from_slice(&bytes, bincode::config::standard()) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!("discarding corrupt shader cache file {}: {e}", path.display());
                return None;
            }
        };
    if &entry.content_hash != expected_hash {
        log::warn!(
            "discarding shader cache file {} with mismatched content hash",
            path.display()
        );
        return None;
    }
    Some(entry)
}

fn store_entry(path: &Path, entry: &ShaderCacheEntry) -> Result<(), CompileError> {
    let bytes = bincode::serde::encode_to_vec(entry, bincode::config::standard()).map_err(|e| {
        CompileError::Cache {
            path: path.display().to_string(),
            details: e.to_string(),
        }
    })?;
    fs::write(path, bytes).map_err(|e| CompileError::Cache {
        path: path.display().to_string(),
        details: e.to_string(),
    })?;
    log::debug!("persisted shader cache entry: {}", path.display());
    Ok(())
}

/// Keeps shader names filesystem-safe without losing their identity.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_carries_name_hash_and_target() {
        let hash = [0xab; 32];
        let file = ShaderCache::file_name("ui/text", &hash, BackendKind::Metal);
        assert!(file.starts_with("ui_text."));
        assert!(file.ends_with(".metal"));
        assert!(file.contains(&"ab".repeat(32)));
    }

    #[test]
    fn in_memory_cache_reports_no_dir() {
        let cache = ShaderCache::in_memory();
        assert!(cache.dir().is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
