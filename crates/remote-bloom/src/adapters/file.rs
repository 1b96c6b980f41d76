use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bitvec::prelude::*;
use fs2::FileExt;

use crate::domain::DEFAULT_MAX_BITS;
use crate::error::StoreError;
use crate::ports::{check_offset, BitStore};

type Arrays = HashMap<String, Vec<u8>>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Access {
    Shared,
    Exclusive,
}

/// File-backed bit store shared between processes on one host.
///
/// All arrays live in a single bincode file. Every operation takes an `fs2` lock on a
/// sidecar `.lock` file (shared for reads, exclusive for writes), reloads the data
/// file, and writes it back atomically via a temp file. Each call is therefore atomic
/// across processes, at the cost of a full file rewrite per write. Suited to small
/// filters and development; large filters belong in a real bit store.
pub struct FileBackedBitStore {
    path: PathBuf,
    lock_path: PathBuf,
    max_bits: u64,
}

impl FileBackedBitStore {
    /// Create a store at the given path. The file is created on first write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_max_bits(path, DEFAULT_MAX_BITS)
    }

    pub fn with_max_bits<P: AsRef<Path>>(path: P, max_bits: u64) -> Self {
        let path = path.as_ref().to_path_buf();
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            max_bits,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` against the loaded arrays while holding the file lock
    async fn with_arrays<R, F>(&self, access: Access, op: F) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Arrays) -> R + Send + 'static,
        R: Send + 'static,
    {
        let path = self.path.clone();
        let lock_path = self.lock_path.clone();

        tokio::task::spawn_blocking(move || -> Result<R, StoreError> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }

            let lock = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)?;
            match access {
                Access::Shared => FileExt::lock_shared(&lock)?,
                Access::Exclusive => FileExt::lock_exclusive(&lock)?,
            }

            let mut arrays = load_from_file(&path)?;
            let result = op(&mut arrays);
            if access == Access::Exclusive {
                save_to_file(&path, &arrays)?;
            }

            FileExt::unlock(&lock)?;
            Ok(result)
        })
        .await
        .map_err(|e| StoreError::Io(format!("store task failed: {e}")))?
    }
}

fn load_from_file(path: &Path) -> Result<Arrays, StoreError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Arrays::new()),
        Err(e) => return Err(e.into()),
    };

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    if bytes.is_empty() {
        return Ok(Arrays::new());
    }

    bincode::deserialize(&bytes).map_err(|e| StoreError::Corrupt(e.to_string()))
}

fn save_to_file(path: &Path, arrays: &Arrays) -> Result<(), StoreError> {
    let bytes = bincode::serialize(arrays).map_err(|e| StoreError::Corrupt(e.to_string()))?;

    // Write atomically via temp file
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;
    file.write_all(&bytes)?;
    file.sync_all()?;

    fs::rename(&temp_path, path)?;
    Ok(())
}

#[async_trait]
impl BitStore for FileBackedBitStore {
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let key = key.to_string();
        self.with_arrays(Access::Shared, move |arrays| arrays.contains_key(&key))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = key.to_string();
        self.with_arrays(Access::Exclusive, move |arrays| {
            arrays.remove(&key);
        })
        .await
    }

    async fn set_bit(&self, key: &str, offset: u64, value: bool) -> Result<(), StoreError> {
        check_offset(offset, self.max_bits)?;
        let key = key.to_string();
        let offset = offset as usize;

        self.with_arrays(Access::Exclusive, move |arrays| {
            let bytes = arrays.entry(key).or_default();
            if offset / 8 >= bytes.len() {
                bytes.resize(offset / 8 + 1, 0);
            }
            bytes.view_bits_mut::<Msb0>().set(offset, value);
        })
        .await
    }

    async fn get_bit(&self, key: &str, offset: u64) -> Result<bool, StoreError> {
        check_offset(offset, self.max_bits)?;
        let key = key.to_string();
        let offset = offset as usize;

        self.with_arrays(Access::Shared, move |arrays| {
            arrays
                .get(&key)
                .and_then(|bytes| bytes.view_bits::<Msb0>().get(offset).map(|bit| *bit))
                .unwrap_or(false)
        })
        .await
    }

    async fn byte_len(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let key = key.to_string();
        self.with_arrays(Access::Shared, move |arrays| {
            Some(arrays.get(&key).map_or(0, |bytes| bytes.len() as u64))
        })
        .await
    }

    fn max_bits(&self) -> u64 {
        self.max_bits
    }
}
