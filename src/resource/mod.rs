pub mod file;
pub mod memory;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Failed to read {length} bytes at offset {offset} from {name}: {source}")]
    Range {
        name: String,
        offset: u64,
        length: usize,
        source: std::io::Error,
    },
}

/// Byte-range access to a backing resource.
///
/// `read_range` is a complete read each call; implementations keep no cursor
/// between calls, so independent readers over the same resource never
/// interfere.
pub trait ResourceReader {
    /// Read the entire resource.
    fn read(&self) -> Result<Vec<u8>, ResourceError>;

    /// Read exactly `length` bytes starting at `offset`. A short read is an
    /// error naming the failing range.
    fn read_range(&self, offset: u64, length: usize) -> Result<Vec<u8>, ResourceError>;
}
