use super::{ResourceError, ResourceReader};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Reader over a file on disk. The file is opened on every call, so there is
/// no shared read cursor to reposition between calls.
#[derive(Clone, Debug)]
pub struct FileResource {
    path: PathBuf,
}

impl FileResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn range_error(&self, offset: u64, length: usize, source: std::io::Error) -> ResourceError {
        ResourceError::Range {
            name: self.path.display().to_string(),
            offset,
            length,
            source,
        }
    }
}

impl ResourceReader for FileResource {
    fn read(&self) -> Result<Vec<u8>, ResourceError> {
        Ok(std::fs::read(&self.path)?)
    }

    fn read_range(&self, offset: u64, length: usize) -> Result<Vec<u8>, ResourceError> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|source| self.range_error(offset, length, source))?;

        let mut bytes = vec![0; length];
        file.read_exact(&mut bytes)
            .map_err(|source| self.range_error(offset, length, source))?;

        Ok(bytes)
    }
}
