//! One source-set's namespace file.
//!
//! Layout: a 16-byte header followed by a postcard-encoded map of named
//! string-to-string maps.
//!
//! - 0-3: magic `QXRS`
//! - 4-7: format version
//! - 8-11: CRC32 of the body
//! - 12-15: body length in bytes

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::ops::Deref;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use memmap2::Mmap;

use super::StoreError;

pub(crate) const MAGIC: [u8; 4] = *b"QXRS";
pub(crate) const VERSION: u32 = 1;
pub(crate) const HEADER_SIZE: usize = 16;

pub(crate) type Maps = IndexMap<String, IndexMap<String, String>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Header {
    pub magic: [u8; 4],
    pub version: u32,
    pub checksum: u32,
    pub body_len: u32,
}

impl Header {
    pub(crate) fn for_body(body: &[u8]) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            checksum: crc32fast::hash(body),
            body_len: body.len() as u32,
        }
    }

    pub(crate) fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Self {
        Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            checksum: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            body_len: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        }
    }

    pub(crate) fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.body_len.to_le_bytes());
        bytes
    }
}

/// Namespace bytes: owned for the primary, memory-mapped for dependencies.
enum Storage {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl Deref for Storage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Owned(bytes) => bytes,
            Self::Mapped(map) => map,
        }
    }
}

impl Storage {
    fn read(path: &Path, mapped: bool) -> io::Result<Option<Self>> {
        let mut file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        // Zero-length files cannot be mapped; they are reported as corrupt below.
        if mapped && file.metadata()?.len() > 0 {
            // SAFETY: dependency namespaces are only ever replaced by rename,
            // never modified in place, so the mapped bytes stay valid.
            let map = unsafe { Mmap::map(&file)? };
            return Ok(Some(Self::Mapped(map)));
        }
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(Some(Self::Owned(bytes)))
    }
}

#[derive(Debug)]
pub(crate) struct Namespace {
    name: String,
    path: PathBuf,
    maps: Maps,
    dirty: bool,
}

impl Namespace {
    pub(crate) fn file_path(root: &Path, name: &str) -> PathBuf {
        root.join(format!("{name}.xrs"))
    }

    /// Load a namespace. A missing file reads as empty.
    pub(crate) fn open(root: &Path, name: &str, mapped: bool) -> Result<Self, StoreError> {
        let path = Self::file_path(root, name);
        let storage = Storage::read(&path, mapped).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
        let maps = match storage {
            Some(bytes) => decode(name, &bytes)?,
            None => Maps::new(),
        };
        log::debug!(
            "opened store namespace `{name}` ({} maps) from {}",
            maps.len(),
            path.display()
        );
        Ok(Self {
            name: name.to_string(),
            path,
            maps,
            dirty: false,
        })
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn get(&self, map: &str, key: &str) -> Option<&str> {
        self.maps.get(map)?.get(key).map(String::as_str)
    }

    pub(crate) fn put(&mut self, map: &str, key: String, value: String) {
        let entries = self.maps.entry(map.to_string()).or_default();
        if entries.get(&key) != Some(&value) {
            entries.insert(key, value);
            self.dirty = true;
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the namespace atomically (temp file + rename) if it changed.
    pub(crate) fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        let bytes = encode(&self.maps);
        let tmp = self.path.with_extension("xrs.tmp");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let mut file = File::create(&tmp).map_err(io_error(&tmp))?;
        file.write_all(&bytes).map_err(io_error(&tmp))?;
        file.sync_all().map_err(io_error(&tmp))?;
        fs::rename(&tmp, &self.path).map_err(io_error(&self.path))?;

        log::debug!(
            "flushed store namespace `{}` ({} bytes)",
            self.name,
            bytes.len()
        );
        self.dirty = false;
        Ok(())
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StoreError + use<> {
    let path = path.to_path_buf();
    move |source| StoreError::Io { path, source }
}

pub(crate) fn encode(maps: &Maps) -> Vec<u8> {
    let body = postcard::to_allocvec(maps).expect("serialization should not fail");
    let mut bytes = Vec::with_capacity(HEADER_SIZE + body.len());
    bytes.extend_from_slice(&Header::for_body(&body).to_bytes());
    bytes.extend_from_slice(&body);
    bytes
}

pub(crate) fn decode(name: &str, bytes: &[u8]) -> Result<Maps, StoreError> {
    let corrupt = |reason: String| StoreError::Corrupt {
        namespace: name.to_string(),
        reason,
    };

    let Some((head, body)) = bytes.split_first_chunk::<HEADER_SIZE>() else {
        return Err(corrupt(format!("file too small: {} bytes", bytes.len())));
    };
    let header = Header::from_bytes(head);

    if header.magic != MAGIC {
        return Err(corrupt("invalid magic".into()));
    }
    if header.version != VERSION {
        return Err(corrupt(format!(
            "unsupported version {} (expected {VERSION})",
            header.version
        )));
    }
    if header.body_len as usize != body.len() {
        return Err(corrupt(format!(
            "size mismatch: header says {} bytes, got {}",
            header.body_len,
            body.len()
        )));
    }
    if crc32fast::hash(body) != header.checksum {
        return Err(corrupt("checksum mismatch".into()));
    }

    postcard::from_bytes(body).map_err(|e| corrupt(e.to_string()))
}
