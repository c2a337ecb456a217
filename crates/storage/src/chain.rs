//! Persisted chain documents.
//!
//! The on-disk form is `{ "length": n, "blocks": [...] }`. Loading checks the
//! declared length and every block's hash invariant; linkage is checked by the
//! chain when the blocks are restored.

use crate::db::{read_json, write_json, Result, Storage, StorageError};
use powbench_core::HashedBlock;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Serialized form of a chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainDocument {
    pub length: usize,
    pub blocks: Vec<HashedBlock>,
}

impl ChainDocument {
    pub fn new(blocks: Vec<HashedBlock>) -> Self {
        Self {
            length: blocks.len(),
            blocks,
        }
    }

    /// Check the declared length and every block's digest.
    pub fn check(&self) -> Result<()> {
        if self.length != self.blocks.len() {
            return Err(StorageError::LengthMismatch {
                declared: self.length,
                actual: self.blocks.len(),
            });
        }
        if self.blocks.is_empty() {
            return Err(StorageError::EmptyChain);
        }
        for (index, block) in self.blocks.iter().enumerate() {
            let computed = block.compute_hash();
            if computed != block.hash {
                return Err(StorageError::HashMismatch {
                    index,
                    stored: block.hash.to_hex(),
                    computed: computed.to_hex(),
                });
            }
        }
        Ok(())
    }

    /// Parse and check a document from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: Self = serde_json::from_str(json)?;
        doc.check()?;
        Ok(doc)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and check a document from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc: Self = read_json(path.as_ref())?;
        doc.check()?;
        debug!(path = %path.as_ref().display(), blocks = doc.length, "chain file loaded");
        Ok(doc)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        write_json(path.as_ref(), self)
    }
}

/// Chain files inside a [`Storage`] directory.
pub struct ChainStore<'a> {
    storage: &'a Storage,
}

impl<'a> ChainStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Write a chain document under `name`.
    pub fn put(&self, name: &str, doc: &ChainDocument) -> Result<std::path::PathBuf> {
        self.storage.put_json(name, doc)
    }

    /// Load and check the chain document stored under `name`.
    pub fn get(&self, name: &str) -> Result<Option<ChainDocument>> {
        let path = self.storage.path(name);
        if !path.exists() {
            return Ok(None);
        }
        ChainDocument::load(path).map(Some)
    }
}
