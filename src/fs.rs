//! # File Store
//!
//! Named-file storage used by the file commands and the transfer session.
//! [`RamFiles`] is a flat, fixed-capacity implementation kept entirely in
//! RAM; boards with an SD card provide their own [`FileStore`].

use heapless::{String, Vec};

use crate::config::FILE_NAME_LEN;
use crate::error::{Error, Result};

/// Bounded file name.
pub type FileName = String<FILE_NAME_LEN>;

/// One line of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: FileName,
    pub is_dir: bool,
    pub size: usize,
}

pub trait FileStore {
    fn exists(&mut self, name: &str) -> bool;

    /// Create an empty file. Fails if `name` already exists.
    fn create(&mut self, name: &str) -> Result<()>;

    fn delete(&mut self, name: &str) -> Result<()>;

    /// Call `visit` once per entry in the root directory.
    fn list(&mut self, visit: &mut dyn FnMut(&FileEntry));

    /// Copy bytes starting at `offset` into `buf`, returning how many were
    /// copied. Zero means end of file.
    fn read(&mut self, name: &str, offset: usize, buf: &mut [u8]) -> Result<usize>;

    /// Replace the content of `name`, creating it if needed.
    fn write(&mut self, name: &str, data: &[u8]) -> Result<()>;
}

/// Validate and copy a file name.
pub fn file_name(name: &str) -> Result<FileName> {
    let mut out = FileName::new();
    out.push_str(name).map_err(|_| Error::NameTooLong)?;
    Ok(out)
}

// ---------------------------------------------------------------------------
// RAM-backed store
// ---------------------------------------------------------------------------

struct RamFile<const SIZE: usize> {
    name: FileName,
    data: Vec<u8, SIZE>,
}

/// Up to `FILES` files of at most `SIZE` bytes each.
pub struct RamFiles<const FILES: usize, const SIZE: usize> {
    files: Vec<RamFile<SIZE>, FILES>,
}

impl<const FILES: usize, const SIZE: usize> RamFiles<FILES, SIZE> {
    pub const fn new() -> Self {
        Self { files: Vec::new() }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.files.iter().position(|f| f.name == name)
    }

    /// Content of `name`, if present.
    pub fn contents(&self, name: &str) -> Option<&[u8]> {
        self.position(name).map(|i| &self.files[i].data[..])
    }
}

impl<const FILES: usize, const SIZE: usize> Default for RamFiles<FILES, SIZE> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const FILES: usize, const SIZE: usize> FileStore for RamFiles<FILES, SIZE> {
    fn exists(&mut self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn create(&mut self, name: &str) -> Result<()> {
        if self.position(name).is_some() {
            return Err(Error::FileExists);
        }
        let file = RamFile { name: file_name(name)?, data: Vec::new() };
        self.files.push(file).map_err(|_| Error::NoSpace)
    }

    fn delete(&mut self, name: &str) -> Result<()> {
        let i = self.position(name).ok_or(Error::UnknownFile)?;
        self.files.remove(i);
        Ok(())
    }

    fn list(&mut self, visit: &mut dyn FnMut(&FileEntry)) {
        for f in &self.files {
            visit(&FileEntry { name: f.name.clone(), is_dir: false, size: f.data.len() });
        }
    }

    fn read(&mut self, name: &str, offset: usize, buf: &mut [u8]) -> Result<usize> {
        let i = self.position(name).ok_or(Error::UnknownFile)?;
        let data = &self.files[i].data;
        let start = offset.min(data.len());
        let n = buf.len().min(data.len() - start);
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<()> {
        if data.len() > SIZE {
            return Err(Error::NoSpace);
        }
        let i = match self.position(name) {
            Some(i) => i,
            None => {
                self.create(name)?;
                self.files.len() - 1
            }
        };
        let file = &mut self.files[i].data;
        file.clear();
        file.extend_from_slice(data).map_err(|_| Error::NoSpace)
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
