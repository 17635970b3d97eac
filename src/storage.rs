//! Storage abstraction used to persist store snapshots.
//!
//! File and memory backends can be swapped without touching the
//! snapshot code.
//!
//! # Example
//!
//! ```
//! use reclaim::storage::memory::MemoryStorage;
//! use reclaim::storage::{Storage, read_all, write_atomic};
//!
//! # fn main() -> reclaim::error::Result<()> {
//! let storage = MemoryStorage::new();
//! write_atomic(&storage, "store.json", b"{}")?;
//! assert_eq!(read_all(&storage, "store.json")?, b"{}");
//! # Ok(())
//! # }
//! ```

use std::io::{Read, Write};

use crate::error::{ReclaimError, Result};

pub mod file;
pub mod memory;

/// A trait for storage backends that can store and retrieve named blobs.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// Open a file for reading. The file must exist.
    fn open_input(&self, name: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing.
    fn create_output(&self, name: &str) -> Result<Box<dyn StorageOutput>>;

    /// Check if a file exists.
    fn file_exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete_file(&self, name: &str) -> Result<()>;

    /// List all files in the storage, sorted by name.
    fn list_files(&self) -> Result<Vec<String>>;

    /// Get the size of a file in bytes.
    fn file_size(&self, name: &str) -> Result<u64>;

    /// Rename a file, replacing any existing file with the new name.
    fn rename_file(&self, old_name: &str, new_name: &str) -> Result<()>;
}

/// A trait for reading data from storage.
pub trait StorageInput: Read + Send + std::fmt::Debug {
    /// Get the size of the input stream.
    fn size(&self) -> Result<u64>;
}

/// A trait for writing data to storage.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush and sync the output to storage.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Close the output stream. Written data becomes visible at the latest here.
    fn close(&mut self) -> Result<()>;
}

/// Read a whole file into memory.
pub fn read_all(storage: &dyn Storage, name: &str) -> Result<Vec<u8>> {
    let mut input = storage.open_input(name)?;
    let mut buffer = Vec::with_capacity(input.size().unwrap_or(0) as usize);
    input.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Write `bytes` to `name` through a temporary file and a rename, so readers
/// never observe a half-written file.
pub fn write_atomic(storage: &dyn Storage, name: &str, bytes: &[u8]) -> Result<()> {
    let tmp_name = format!("{name}.tmp");
    let mut output = storage.create_output(&tmp_name)?;
    output.write_all(bytes)?;
    output.flush_and_sync()?;
    output.close()?;
    storage.rename_file(&tmp_name, name).map_err(|e| {
        storage.delete_file(&tmp_name).ok();
        ReclaimError::storage(format!("failed to publish {name}: {e}"))
    })
}
