// archive.rs — bidirectional binary archive and the save-file container
//
// One `Archive` value both stores and loads. Serialization code is written
// once as a sequence of `io` calls; the archive's mode decides whether each
// call writes the field or reads it back. All integers are little-endian.
//
// A save file is:
//   magic "ECWS" | product u32 | save u32 | crc16 u16 | body length u32 | deflate(body)
//
// The checksum covers the two version words and the inflated body.

use std::fmt;

use thiserror::Error;

use crate::compression::{compress_data, decompress_with_size, MAX_DECOMPRESS_SIZE};
use crate::crc::crc_parts;

pub const SAVE_MAGIC: &[u8; 4] = b"ECWS";
const HEADER_SIZE: usize = 4 + 4 + 4 + 2 + 4;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("unexpected end of archive: wanted {wanted} bytes at offset {offset}")]
    UnexpectedEof { wanted: usize, offset: usize },

    #[error("invalid UTF-8 string at offset {0}")]
    InvalidString(usize),

    #[error("not a save file")]
    BadMagic,

    #[error("save body checksum mismatch: stored {expected:#06x}, computed {computed:#06x}")]
    ChecksumMismatch { expected: u16, computed: u16 },

    #[error("save was written by a newer engine ({0})")]
    NewerVersion(SaveVersion),

    #[error("save body codec failure: {0}")]
    Deflate(String),
}

/// The two version counters stamped into every save. `product` tracks engine
/// releases (0x00MMmmpp-style), `save` is a timestamp bumped on format changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SaveVersion {
    pub product: u32,
    pub save: u32,
}

impl SaveVersion {
    pub const CURRENT: SaveVersion = SaveVersion::new(0x0010_03FF, 1_507_591_295);

    pub const fn new(product: u32, save: u32) -> Self {
        Self { product, save }
    }

    #[inline]
    pub fn product_at_least(&self, product: u32) -> bool {
        self.product >= product
    }

    #[inline]
    pub fn save_at_least(&self, save: u32) -> bool {
        self.save >= save
    }

    /// Strictly newer save counter.
    #[inline]
    pub fn save_after(&self, save: u32) -> bool {
        self.save > save
    }

    /// True if either counter is ahead of what this build writes.
    pub fn is_newer_than_current(&self) -> bool {
        self.product > Self::CURRENT.product || self.save > Self::CURRENT.save
    }
}

impl Default for SaveVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for SaveVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "product {:#010x}, save {}", self.product, self.save)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveMode {
    Storing,
    Loading,
}

#[derive(Debug)]
pub struct Archive {
    mode: ArchiveMode,
    data: Vec<u8>,
    pos: usize,
    version: SaveVersion,
}

impl Archive {
    /// A storing archive stamped with the current version.
    pub fn storing() -> Self {
        Self::storing_as(SaveVersion::CURRENT)
    }

    /// A storing archive that lays fields out as an older build would.
    pub fn storing_as(version: SaveVersion) -> Self {
        Self {
            mode: ArchiveMode::Storing,
            data: Vec::new(),
            pos: 0,
            version,
        }
    }

    pub fn loading(data: Vec<u8>, version: SaveVersion) -> Self {
        Self {
            mode: ArchiveMode::Loading,
            data,
            pos: 0,
            version,
        }
    }

    #[inline]
    pub fn is_storing(&self) -> bool {
        self.mode == ArchiveMode::Storing
    }

    #[inline]
    pub fn is_loading(&self) -> bool {
        self.mode == ArchiveMode::Loading
    }

    #[inline]
    pub fn version(&self) -> SaveVersion {
        self.version
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&[u8], ArchiveError> {
        if self.remaining() < n {
            return Err(ArchiveError::UnexpectedEof {
                wanted: n,
                offset: self.pos,
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..start + n])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ArchiveError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    /// Store `value`, or overwrite it with the next value in the archive.
    pub fn io<T: Archivable>(&mut self, value: &mut T) -> Result<&mut Self, ArchiveError> {
        if self.is_storing() {
            value.store(self);
        } else {
            *value = T::load(self)?;
        }
        Ok(self)
    }

    /// Write-only half of `io`, for values that are computed when storing.
    pub fn put<T: Archivable>(&mut self, value: &T) {
        value.store(self);
    }

    /// Read-only half of `io`.
    pub fn get<T: Archivable>(&mut self) -> Result<T, ArchiveError> {
        T::load(self)
    }
}

/// A value with a fixed binary layout in the archive.
pub trait Archivable: Sized {
    fn store(&self, ar: &mut Archive);
    fn load(ar: &mut Archive) -> Result<Self, ArchiveError>;
}

macro_rules! archivable_int {
    ($($t:ty),*) => {$(
        impl Archivable for $t {
            fn store(&self, ar: &mut Archive) {
                ar.write_bytes(&self.to_le_bytes());
            }
            fn load(ar: &mut Archive) -> Result<Self, ArchiveError> {
                Ok(<$t>::from_le_bytes(ar.read_array()?))
            }
        }
    )*};
}

archivable_int!(u8, u16, u32, u64, i8, i16, i32, i64);

impl Archivable for bool {
    fn store(&self, ar: &mut Archive) {
        ar.write_bytes(&[*self as u8]);
    }
    fn load(ar: &mut Archive) -> Result<Self, ArchiveError> {
        Ok(u8::load(ar)? != 0)
    }
}

impl Archivable for f32 {
    fn store(&self, ar: &mut Archive) {
        ar.write_bytes(&self.to_bits().to_le_bytes());
    }
    fn load(ar: &mut Archive) -> Result<Self, ArchiveError> {
        Ok(f32::from_bits(u32::load(ar)?))
    }
}

impl Archivable for String {
    fn store(&self, ar: &mut Archive) {
        (self.len() as u32).store(ar);
        ar.write_bytes(self.as_bytes());
    }
    fn load(ar: &mut Archive) -> Result<Self, ArchiveError> {
        let offset = ar.position();
        let len = u32::load(ar)? as usize;
        let bytes = ar.read_bytes(len)?.to_vec();
        String::from_utf8(bytes).map_err(|_| ArchiveError::InvalidString(offset))
    }
}

impl<T: Archivable> Archivable for Option<T> {
    fn store(&self, ar: &mut Archive) {
        match self {
            Some(v) => {
                true.store(ar);
                v.store(ar);
            }
            None => false.store(ar),
        }
    }
    fn load(ar: &mut Archive) -> Result<Self, ArchiveError> {
        if bool::load(ar)? {
            Ok(Some(T::load(ar)?))
        } else {
            Ok(None)
        }
    }
}

impl<T: Archivable> Archivable for Vec<T> {
    fn store(&self, ar: &mut Archive) {
        (self.len() as u32).store(ar);
        for item in self {
            item.store(ar);
        }
    }
    fn load(ar: &mut Archive) -> Result<Self, ArchiveError> {
        let count = u32::load(ar)? as usize;
        // every element takes at least one byte
        let mut out = Vec::with_capacity(count.min(ar.remaining()));
        for _ in 0..count {
            out.push(T::load(ar)?);
        }
        Ok(out)
    }
}

impl<A: Archivable, B: Archivable> Archivable for (A, B) {
    fn store(&self, ar: &mut Archive) {
        self.0.store(ar);
        self.1.store(ar);
    }
    fn load(ar: &mut Archive) -> Result<Self, ArchiveError> {
        let a = A::load(ar)?;
        let b = B::load(ar)?;
        Ok((a, b))
    }
}

// ============================================================
// Save container
// ============================================================

fn stamp_crc(version: SaveVersion, body: &[u8]) -> u16 {
    crc_parts([
        &version.product.to_le_bytes()[..],
        &version.save.to_le_bytes()[..],
        body,
    ])
}

/// Wrap a serialized body in the save container.
pub fn encode_save(version: SaveVersion, body: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    if body.len() > MAX_DECOMPRESS_SIZE {
        return Err(ArchiveError::Deflate(format!(
            "body of {} bytes is too large",
            body.len()
        )));
    }
    let packed = compress_data(body).map_err(ArchiveError::Deflate)?;

    let mut out = Vec::with_capacity(HEADER_SIZE + packed.len());
    out.extend_from_slice(SAVE_MAGIC);
    out.extend_from_slice(&version.product.to_le_bytes());
    out.extend_from_slice(&version.save.to_le_bytes());
    out.extend_from_slice(&stamp_crc(version, body).to_le_bytes());
    out.extend_from_slice(&(body.len() as u32).to_le_bytes());
    out.extend_from_slice(&packed);
    Ok(out)
}

/// Unwrap a save container, returning its version stamp and inflated body.
pub fn decode_save(bytes: &[u8]) -> Result<(SaveVersion, Vec<u8>), ArchiveError> {
    if bytes.len() < SAVE_MAGIC.len() || &bytes[..SAVE_MAGIC.len()] != SAVE_MAGIC {
        return Err(ArchiveError::BadMagic);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(ArchiveError::UnexpectedEof {
            wanted: HEADER_SIZE,
            offset: 0,
        });
    }

    let mut header = Archive::loading(bytes[4..HEADER_SIZE].to_vec(), SaveVersion::CURRENT);
    let product: u32 = header.get()?;
    let save: u32 = header.get()?;
    let expected: u16 = header.get()?;
    let body_len: u32 = header.get()?;

    let version = SaveVersion::new(product, save);
    if version.is_newer_than_current() {
        return Err(ArchiveError::NewerVersion(version));
    }

    let body = decompress_with_size(&bytes[HEADER_SIZE..], body_len as usize)
        .map_err(ArchiveError::Deflate)?;
    let computed = stamp_crc(version, &body);
    if computed != expected {
        return Err(ArchiveError::ChecksumMismatch { expected, computed });
    }
    Ok((version, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_io_chains_fields() {
        let mut ar = Archive::storing();
        let (mut a, mut b, mut c) = (7i32, String::from("Guard"), Some(3u16));
        ar.io(&mut a).unwrap().io(&mut b).unwrap().io(&mut c).unwrap();
        let bytes = ar.into_bytes();

        let mut ar = Archive::loading(bytes, SaveVersion::CURRENT);
        let (mut a2, mut b2, mut c2) = (0i32, String::new(), None::<u16>);
        ar.io(&mut a2).unwrap().io(&mut b2).unwrap().io(&mut c2).unwrap();
        assert_eq!((a2, b2.as_str(), c2), (7, "Guard", Some(3)));
        assert_eq!(ar.remaining(), 0);
    }

    #[test]
    fn test_little_endian_layout() {
        let mut ar = Archive::storing();
        ar.put(&0x0102_0304u32);
        assert_eq!(ar.into_bytes(), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_truncated_read_fails() {
        let mut ar = Archive::loading(vec![1, 2], SaveVersion::CURRENT);
        match ar.get::<u32>() {
            Err(ArchiveError::UnexpectedEof { wanted: 4, offset: 0 }) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_string() {
        let mut ar = Archive::loading(vec![2, 0, 0, 0, 0xff, 0xfe], SaveVersion::CURRENT);
        assert!(matches!(ar.get::<String>(), Err(ArchiveError::InvalidString(0))));
    }

    #[test]
    fn test_version_predicates() {
        let v = SaveVersion::new(0x0010_02FF, 1_374_914_454);
        assert!(v.product_at_least(0x0010_02FF));
        assert!(!v.product_at_least(0x0010_03FF));
        assert!(v.save_at_least(1_374_914_454));
        assert!(!v.save_after(1_374_914_454));
        assert!(!v.is_newer_than_current());
        assert!(SaveVersion::new(0x0020_0000, 0).is_newer_than_current());
    }

    #[test]
    fn test_container_roundtrip() {
        let body: Vec<u8> = (0..300).map(|i| (i * 7) as u8).collect();
        let old = SaveVersion::new(0x0010_02FF, 1_400_000_000);
        let file = encode_save(old, &body).unwrap();
        assert_eq!(&file[..4], SAVE_MAGIC);
        let (version, restored) = decode_save(&file).unwrap();
        assert_eq!(version, old);
        assert_eq!(restored, body);
    }

    #[test]
    fn test_container_rejects_bad_magic() {
        assert!(matches!(decode_save(b"WOLF1234"), Err(ArchiveError::BadMagic)));
        assert!(matches!(decode_save(b""), Err(ArchiveError::BadMagic)));
    }

    #[test]
    fn test_container_detects_corruption() {
        let mut file = encode_save(SaveVersion::CURRENT, b"some actor data").unwrap();
        // flip a stored checksum bit
        file[12] ^= 0x01;
        assert!(matches!(
            decode_save(&file),
            Err(ArchiveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_container_detects_restamped_version() {
        let old = SaveVersion::new(0x0010_02FF, 1_400_000_000);
        let mut file = encode_save(old, b"guard record").unwrap();
        file[8] ^= 0x01;
        assert!(matches!(
            decode_save(&file),
            Err(ArchiveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_container_rejects_newer() {
        let newer = SaveVersion::new(SaveVersion::CURRENT.product + 1, SaveVersion::CURRENT.save);
        let file = encode_save(newer, b"x").unwrap();
        assert!(matches!(decode_save(&file), Err(ArchiveError::NewerVersion(v)) if v == newer));
    }

    proptest! {
        #[test]
        fn prop_vec_and_strings_survive(items in proptest::collection::vec((any::<i32>(), ".{0,12}"), 0..20)) {
            let mut stored: Vec<(i32, String)> = items.clone();
            let mut ar = Archive::storing();
            ar.io(&mut stored).unwrap();
            let mut ar = Archive::loading(ar.into_bytes(), SaveVersion::CURRENT);
            let mut loaded: Vec<(i32, String)> = Vec::new();
            ar.io(&mut loaded).unwrap();
            prop_assert_eq!(loaded, items);
        }
    }
}
