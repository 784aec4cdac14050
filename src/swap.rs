//! # Swap Subsystem
//!
//! Persists task records to a byte-addressable non-volatile store so that
//! more tasks can be registered than fit in the working set.
//!
//! ## Image Layout
//!
//! Each registry slot owns a fixed window of `RECORD_SIZE` bytes at
//! `slot * RECORD_SIZE`. The task body is never persisted; on restore it is
//! re-resolved through the registry by name.
//!
//! ```text
//!  0         10        14        18        22        26   27
//!  ┌─────────┬─────────┬─────────┬─────────┬─────────┬────┐
//!  │ name    │duration │ start   │ end     │priority │ ck │
//!  │ NUL pad │ u32 LE  │ u32 LE  │ u32 LE  │ i32 LE  │ u8 │
//!  └─────────┴─────────┴─────────┴─────────┴─────────┴────┘
//! ```
//!
//! Every byte is written as its own store transaction and each write is
//! assumed complete when `ByteStore::write` returns.

use log::{debug, warn};

use crate::config::TASK_NAME_LEN;
use crate::error::{Error, Result};
use crate::task::{truncate_name, Residency, TaskRecord};

/// Width of the persisted name field.
const NAME_FIELD: usize = TASK_NAME_LEN + 1;

/// Size of one persisted task image in bytes.
pub const RECORD_SIZE: usize = NAME_FIELD + 4 + 4 + 4 + 4 + 1;

const CHECKSUM_SEED: u8 = 0xA5;

// ---------------------------------------------------------------------------
// Byte store
// ---------------------------------------------------------------------------

/// Raw non-volatile memory with single-byte transactions.
///
/// The primitive has no failure signal; corruption is only caught when a
/// restored image fails validation.
pub trait ByteStore {
    fn write(&mut self, address: u16, value: u8);
    fn read(&mut self, address: u16) -> u8;
}

/// Byte store backed by RAM. Reads outside the array return `0xFF` and
/// writes outside it are dropped, like an unacknowledged EEPROM.
pub struct RamStore<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> RamStore<N> {
    pub const fn new() -> Self {
        Self { bytes: [0xFF; N] }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl<const N: usize> Default for RamStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ByteStore for RamStore<N> {
    fn write(&mut self, address: u16, value: u8) {
        if let Some(b) = self.bytes.get_mut(address as usize) {
            *b = value;
        }
    }

    fn read(&mut self, address: u16) -> u8 {
        self.bytes.get(address as usize).copied().unwrap_or(0xFF)
    }
}

// ---------------------------------------------------------------------------
// Image encoding
// ---------------------------------------------------------------------------

fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b)) ^ CHECKSUM_SEED
}

/// Serialize the persistent fields of `record`.
pub fn encode(record: &TaskRecord) -> [u8; RECORD_SIZE] {
    let mut image = [0u8; RECORD_SIZE];
    let name = record.name.as_bytes();
    image[..name.len()].copy_from_slice(name);

    let mut at = NAME_FIELD;
    for field in [
        record.duration.to_le_bytes(),
        record.start_time.to_le_bytes(),
        record.end_time.to_le_bytes(),
        record.priority.to_le_bytes(),
    ] {
        image[at..at + 4].copy_from_slice(&field);
        at += 4;
    }
    image[at] = checksum(&image[..at]);
    image
}

/// Decode an image into a resident record. Fails when the checksum does not
/// match or the name field is not valid UTF-8.
pub fn decode(image: &[u8; RECORD_SIZE]) -> Option<TaskRecord> {
    let body = &image[..RECORD_SIZE - 1];
    if checksum(body) != image[RECORD_SIZE - 1] {
        return None;
    }

    let name_len = image[..NAME_FIELD].iter().position(|b| *b == 0)?;
    let name = core::str::from_utf8(&image[..name_len]).ok()?;

    let word = |at: usize| [image[at], image[at + 1], image[at + 2], image[at + 3]];
    Some(TaskRecord {
        name: truncate_name(name),
        duration: u32::from_le_bytes(word(NAME_FIELD)),
        start_time: u32::from_le_bytes(word(NAME_FIELD + 4)),
        end_time: u32::from_le_bytes(word(NAME_FIELD + 8)),
        priority: i32::from_le_bytes(word(NAME_FIELD + 12)),
        residency: Residency::Active,
    })
}

// ---------------------------------------------------------------------------
// Swap
// ---------------------------------------------------------------------------

/// Moves task records between the working set and a [`ByteStore`].
pub struct Swap<B> {
    store: B,
}

impl<B: ByteStore> Swap<B> {
    pub const fn new(store: B) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &B {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut B {
        &mut self.store
    }

    #[inline]
    fn base(slot: usize) -> usize {
        slot * RECORD_SIZE
    }

    /// Write `record` to its slot and mark it swapped.
    pub fn evict(&mut self, slot: usize, record: &mut TaskRecord) {
        let image = encode(record);
        let base = Self::base(slot);
        for (i, b) in image.iter().enumerate() {
            self.store.write((base + i) as u16, *b);
        }
        record.residency = Residency::Swapped;
        debug!("swapped out {} to 0x{:04x}", record.name, base);
    }

    /// Read the image at `slot` back into `record` and mark it active.
    ///
    /// The image must carry a valid checksum and the same name as `record`.
    /// On mismatch the in-memory fields are kept, the record is still made
    /// active, and [`Error::CorruptImage`] is returned.
    pub fn restore(&mut self, slot: usize, record: &mut TaskRecord) -> Result<()> {
        let image = self.image(slot);
        match decode(&image) {
            Some(restored) if restored.name == record.name => {
                *record = restored;
                debug!("swapped in {} from 0x{:04x}", record.name, Self::base(slot));
                Ok(())
            }
            _ => {
                record.residency = Residency::Active;
                warn!("swap image for {} in slot {} is corrupt", record.name, slot);
                Err(Error::CorruptImage { slot })
            }
        }
    }

    /// Raw bytes currently stored for `slot`.
    pub fn image(&mut self, slot: usize) -> [u8; RECORD_SIZE] {
        let base = Self::base(slot);
        let mut image = [0u8; RECORD_SIZE];
        for (i, b) in image.iter_mut().enumerate() {
            *b = self.store.read((base + i) as u16);
        }
        image
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------
