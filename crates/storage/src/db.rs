//! Output directory wrapper with serialization helpers.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("chain length field is {declared} but {actual} blocks are present")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("chain file contains no blocks")]
    EmptyChain,

    #[error("block {index} hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch {
        index: usize,
        stored: String,
        computed: String,
    },
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

pub(crate) fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// A directory holding chain files and reports.
#[derive(Debug, Clone)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    /// Open (creating if needed) an output directory.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(io_error(&dir))?;
        Ok(Self { dir })
    }

    /// Directory this storage writes to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a file inside the directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Store a serializable value as pretty-printed JSON.
    pub fn put_json<V: serde::Serialize>(&self, name: &str, value: &V) -> Result<PathBuf> {
        let path = self.path(name);
        write_json(&path, value)?;
        Ok(path)
    }

    /// Retrieve and deserialize a JSON file, `None` if it does not exist.
    pub fn get_json<V: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Option<V>> {
        let path = self.path(name);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }

    /// Store records as CSV with a header row taken from the field names.
    ///
    /// Nothing is written for an empty slice.
    pub fn put_csv<R: serde::Serialize>(&self, name: &str, records: &[R]) -> Result<Option<PathBuf>> {
        if records.is_empty() {
            return Ok(None);
        }
        let path = self.path(name);
        let mut writer = csv::Writer::from_path(&path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush().map_err(io_error(&path))?;
        Ok(Some(path))
    }

    /// Files in the directory whose names start with `prefix`, sorted.
    pub fn files_with_prefix(&self, prefix: &str) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir).map_err(io_error(&self.dir))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(io_error(&self.dir))?.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(prefix));
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

pub(crate) fn write_json<V: serde::Serialize>(path: &Path, value: &V) -> Result<()> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(io_error(path))?;
    Ok(())
}

pub(crate) fn read_json<V: serde::de::DeserializeOwned>(path: &Path) -> Result<V> {
    let file = File::open(path).map_err(io_error(path))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub(crate) fn read_csv<R: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<R>> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<std::result::Result<Vec<R>, csv::Error>>()?;
    Ok(records)
}
