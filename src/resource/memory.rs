use super::{ResourceError, ResourceReader};
use std::io;

/// Reader over an owned in-memory buffer.
#[derive(Clone, Debug, Default)]
pub struct MemoryResource(Vec<u8>);

impl MemoryResource {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl ResourceReader for MemoryResource {
    fn read(&self) -> Result<Vec<u8>, ResourceError> {
        Ok(self.0.clone())
    }

    fn read_range(&self, offset: u64, length: usize) -> Result<Vec<u8>, ResourceError> {
        let start = offset as usize;
        start
            .checked_add(length)
            .and_then(|end| self.0.get(start..end))
            .map(<[u8]>::to_vec)
            .ok_or_else(|| ResourceError::Range {
                name: "memory".to_string(),
                offset,
                length,
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "range is out of bounds"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_reads_are_bounds_checked() {
        let resource = MemoryResource::new(vec![1, 2, 3, 4]);

        assert_eq!(resource.read_range(1, 2).unwrap(), &[2, 3]);
        assert!(resource.read_range(3, 2).is_err());
        assert!(resource.read_range(u64::MAX, 1).is_err());
    }
}
