//! Bookmark Codec - structural decoder for CFURL bookmark blobs
//!
//! Layout (little-endian unless noted):
//! - header: `book` magic, total size, version, header size
//! - at header size: offset of the first table of contents (TOC)
//! - TOC: size, `0xFFFFFFFE` magic, id, next TOC offset, entry count, entries
//! - entry: key, item offset, reserved
//! - item: payload length, type code, payload
//!
//! Every offset after the header is relative to the end of the header. Decoding
//! never touches the file system, so paths can be recovered for files that no
//! longer exist. Items are decoded on lookup, and one lookup visits at most
//! one item per 8 bytes of blob.

use std::cell::Cell;
use std::collections::HashSet;

use crate::{Error, Result};

const MAGIC_BOOK: &[u8] = b"book";
const MAGIC_ALIS: &[u8] = b"alis";
const TOC_MAGIC: u32 = 0xFFFF_FFFE;
const MIN_HEADER_SIZE: usize = 16;
const TOC_HEADER_SIZE: usize = 20;
const TOC_ENTRY_SIZE: usize = 12;
const NAMED_KEY_FLAG: u32 = 0x8000_0000;
const MAX_NESTING: usize = 32;
const MIN_ITEM_SIZE: usize = 8;

const TYPE_MASK: u32 = 0xFFFF_FF00;
const SUBTYPE_MASK: u32 = 0x0000_00FF;

const BMK_STRING: u32 = 0x0100;
const BMK_DATA: u32 = 0x0200;
const BMK_NUMBER: u32 = 0x0300;
const BMK_DATE: u32 = 0x0400;
const BMK_BOOLEAN: u32 = 0x0500;
const BMK_ARRAY: u32 = 0x0600;
const BMK_DICT: u32 = 0x0700;
const BMK_UUID: u32 = 0x0800;
const BMK_URL: u32 = 0x0900;
const BMK_NULL: u32 = 0x0A00;

const BOOLEAN_TRUE: u32 = 1;
const URL_ABSOLUTE: u32 = 1;
const URL_RELATIVE: u32 = 2;

// CFNumber subtypes
const NUMBER_SINT8: u32 = 1;
const NUMBER_SINT16: u32 = 2;
const NUMBER_SINT32: u32 = 3;
const NUMBER_SINT64: u32 = 4;
const NUMBER_FLOAT32: u32 = 5;
const NUMBER_FLOAT64: u32 = 6;

/// Array of path components from the volume root to the target
pub const KEY_PATH: u32 = 0x1004;
/// Mount path of the target's volume
pub const KEY_VOLUME_PATH: u32 = 0x2002;
/// Display name of the target's volume
pub const KEY_VOLUME_NAME: u32 = 0x2010;
/// Volume UUID string recorded when the bookmark was created
pub const KEY_VOLUME_UUID: u32 = 0x2011;

/// A decoded bookmark item
#[derive(Debug, Clone, PartialEq)]
pub enum BookmarkValue {
    String(String),
    Data(Vec<u8>),
    Integer(i64),
    Float(f64),
    /// Seconds since 2001-01-01 00:00:00 UTC
    Date(f64),
    Boolean(bool),
    Array(Vec<BookmarkValue>),
    Dictionary(Vec<(BookmarkValue, BookmarkValue)>),
    Uuid([u8; 16]),
    Url(String),
    RelativeUrl {
        base: Box<BookmarkValue>,
        relative: Box<BookmarkValue>,
    },
    Null,
}

impl BookmarkValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BookmarkValue::String(s) | BookmarkValue::Url(s) => Some(s),
            _ => None,
        }
    }
}

/// Key of a TOC entry: either a well-known numeric id or an inline string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TocKey {
    Id(u32),
    Name(String),
}

/// One table of contents: keys and the offsets of their (undecoded) items
#[derive(Debug, Clone)]
pub struct Toc {
    pub id: u32,
    entries: Vec<(TocKey, u32)>,
}

impl Toc {
    fn offset(&self, key: &TocKey) -> Option<u32> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, offset)| *offset)
    }

    pub fn keys(&self) -> impl Iterator<Item = &TocKey> {
        self.entries.iter().map(|(k, _)| k)
    }
}

/// A bookmark whose header and TOCs have been validated
#[derive(Debug, Clone)]
pub struct Bookmark {
    data: Vec<u8>,
    header_size: usize,
    tocs: Vec<Toc>,
}

impl Bookmark {
    /// Parse a bookmark blob
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < MIN_HEADER_SIZE {
            return Err(invalid("blob too short"));
        }
        let magic = &data[0..4];
        if magic != MAGIC_BOOK && magic != MAGIC_ALIS {
            return Err(invalid(format!("bad magic {magic:?}")));
        }

        let size = read_u32(data, 4)? as usize;
        let header_size = read_u32(data, 12)? as usize;
        if header_size < MIN_HEADER_SIZE {
            return Err(invalid("header size too short"));
        }
        if header_size > size {
            return Err(invalid("header size too large"));
        }
        if size != data.len() {
            return Err(invalid(format!(
                "truncated: header says {size} bytes, blob has {}",
                data.len()
            )));
        }

        let items = ItemDecoder::new(data, header_size);
        let mut tocs = Vec::new();
        let mut seen = HashSet::new();
        let mut toc_offset = read_u32(data, header_size)? as usize;

        while toc_offset != 0 {
            if !seen.insert(toc_offset) {
                return Err(invalid("TOC chain loops"));
            }
            if toc_offset > size - header_size || size - (header_size + toc_offset) < TOC_HEADER_SIZE {
                return Err(invalid(format!("TOC offset {toc_offset} out of range")));
            }
            let toc_base = header_size + toc_offset;

            let toc_size = (read_u32(data, toc_base)? as usize).saturating_add(8);
            let toc_magic = read_u32(data, toc_base + 4)?;
            let toc_id = read_u32(data, toc_base + 8)?;
            let next_toc = read_u32(data, toc_base + 12)?;
            if toc_magic != TOC_MAGIC {
                break;
            }
            if size - toc_base < toc_size {
                return Err(invalid("TOC truncated"));
            }

            let count = read_u32(data, toc_base + 16)? as usize;
            let needed = count
                .checked_mul(TOC_ENTRY_SIZE)
                .and_then(|n| n.checked_add(TOC_HEADER_SIZE));
            if needed.is_none_or(|n| n > toc_size) {
                return Err(invalid("TOC entries overrun TOC size"));
            }

            let mut entries = Vec::with_capacity(count);
            for n in 0..count {
                let entry_base = toc_base + TOC_HEADER_SIZE + TOC_ENTRY_SIZE * n;
                let raw_key = read_u32(data, entry_base)?;
                let value_offset = read_u32(data, entry_base + 4)?;

                let key = if raw_key & NAMED_KEY_FLAG != 0 {
                    match items.decode(raw_key & !NAMED_KEY_FLAG, 0)? {
                        BookmarkValue::String(name) => TocKey::Name(name),
                        other => return Err(invalid(format!("TOC key is not a string: {other:?}"))),
                    }
                } else {
                    TocKey::Id(raw_key)
                };
                entries.push((key, value_offset));
            }

            tocs.push(Toc { id: toc_id, entries });
            toc_offset = next_toc as usize;
        }

        if tocs.is_empty() {
            return Err(invalid("no table of contents"));
        }
        Ok(Self {
            data: data.to_vec(),
            header_size,
            tocs,
        })
    }

    pub fn tocs(&self) -> &[Toc] {
        &self.tocs
    }

    /// Decode the item for a numeric key, searching TOCs in order
    pub fn get(&self, key: u32) -> Result<Option<BookmarkValue>> {
        self.lookup(&TocKey::Id(key))
    }

    /// Decode the item for a string key
    pub fn get_named(&self, name: &str) -> Result<Option<BookmarkValue>> {
        self.lookup(&TocKey::Name(name.to_string()))
    }

    fn lookup(&self, key: &TocKey) -> Result<Option<BookmarkValue>> {
        let Some(offset) = self.tocs.iter().find_map(|toc| toc.offset(key)) else {
            return Ok(None);
        };
        ItemDecoder::new(&self.data, self.header_size)
            .decode(offset, 0)
            .map(Some)
    }

    fn get_string(&self, key: u32) -> Result<Option<String>> {
        Ok(self
            .get(key)?
            .as_ref()
            .and_then(BookmarkValue::as_str)
            .map(str::to_string))
    }

    /// Path components of the target, empty when the bookmark carries no path
    pub fn path_components(&self) -> Result<Vec<String>> {
        match self.get(KEY_PATH)? {
            Some(BookmarkValue::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| invalid(format!("path component is not a string: {item:?}")))
                })
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    pub fn volume_name(&self) -> Result<Option<String>> {
        self.get_string(KEY_VOLUME_NAME)
    }

    pub fn volume_uuid(&self) -> Result<Option<String>> {
        self.get_string(KEY_VOLUME_UUID)
    }

    pub fn volume_path(&self) -> Result<Option<String>> {
        self.get_string(KEY_VOLUME_PATH)
    }
}

/// Decode a blob into the target's path components
pub fn decode(blob: &[u8]) -> Result<Vec<String>> {
    Bookmark::parse(blob)?.path_components()
}

/// Join path components into an absolute path
pub fn canonical_path(components: &[String]) -> String {
    format!("/{}", components.join("/"))
}

struct ItemDecoder<'a> {
    data: &'a [u8],
    header_size: usize,
    /// Items this decoder may still visit
    remaining: Cell<usize>,
}

impl<'a> ItemDecoder<'a> {
    fn new(data: &'a [u8], header_size: usize) -> Self {
        Self {
            data,
            header_size,
            remaining: Cell::new(data.len() / MIN_ITEM_SIZE),
        }
    }

    fn decode(&self, offset: u32, depth: usize) -> Result<BookmarkValue> {
        if depth > MAX_NESTING {
            return Err(invalid("items nested too deeply"));
        }
        let Some(remaining) = self.remaining.get().checked_sub(1) else {
            return Err(invalid("more items than the blob can hold"));
        };
        self.remaining.set(remaining);

        let start = self.header_size + offset as usize;
        if start.checked_add(8).is_none_or(|end| end > self.data.len()) {
            return Err(invalid(format!("item offset {offset} out of range")));
        }
        let length = read_u32(self.data, start)? as usize;
        let code = read_u32(self.data, start + 4)?;
        let payload = self
            .data
            .get(start + 8..(start + 8).saturating_add(length))
            .ok_or_else(|| invalid(format!("item at offset {offset} truncated")))?;
        let subtype = code & SUBTYPE_MASK;

        let value = match code & TYPE_MASK {
            BMK_STRING => BookmarkValue::String(utf8(payload)?),
            BMK_DATA => BookmarkValue::Data(payload.to_vec()),
            BMK_NUMBER => decode_number(subtype, payload)?,
            BMK_DATE => BookmarkValue::Date(f64::from_be_bytes(fixed(payload)?)),
            BMK_BOOLEAN => BookmarkValue::Boolean(subtype == BOOLEAN_TRUE),
            BMK_ARRAY => BookmarkValue::Array(
                payload
                    .chunks_exact(4)
                    .map(|chunk| self.decode(le_u32(chunk), depth + 1))
                    .collect::<Result<Vec<_>>>()?,
            ),
            BMK_DICT => BookmarkValue::Dictionary(
                payload
                    .chunks_exact(8)
                    .map(|pair| {
                        Ok((
                            self.decode(le_u32(&pair[..4]), depth + 1)?,
                            self.decode(le_u32(&pair[4..]), depth + 1)?,
                        ))
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            BMK_UUID => BookmarkValue::Uuid(fixed(payload)?),
            BMK_URL => match subtype {
                URL_ABSOLUTE => BookmarkValue::Url(utf8(payload)?),
                URL_RELATIVE => {
                    let offsets: [u8; 8] = fixed(payload)?;
                    BookmarkValue::RelativeUrl {
                        base: Box::new(self.decode(le_u32(&offsets[..4]), depth + 1)?),
                        relative: Box::new(self.decode(le_u32(&offsets[4..]), depth + 1)?),
                    }
                }
                other => return Err(invalid(format!("unknown URL subtype {other}"))),
            },
            BMK_NULL => BookmarkValue::Null,
            _ => BookmarkValue::Data(payload.to_vec()),
        };
        Ok(value)
    }
}

fn decode_number(subtype: u32, payload: &[u8]) -> Result<BookmarkValue> {
    let value = match subtype {
        NUMBER_SINT8 => BookmarkValue::Integer(i8::from_le_bytes(fixed(payload)?).into()),
        NUMBER_SINT16 => BookmarkValue::Integer(i16::from_le_bytes(fixed(payload)?).into()),
        NUMBER_SINT32 => BookmarkValue::Integer(i32::from_le_bytes(fixed(payload)?).into()),
        NUMBER_SINT64 => BookmarkValue::Integer(i64::from_le_bytes(fixed(payload)?)),
        NUMBER_FLOAT32 => BookmarkValue::Float(f32::from_le_bytes(fixed(payload)?).into()),
        NUMBER_FLOAT64 => BookmarkValue::Float(f64::from_le_bytes(fixed(payload)?)),
        // Other CFNumber types never carry path information
        _ => BookmarkValue::Data(payload.to_vec()),
    };
    Ok(value)
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidBookmark(reason.into())
}

fn utf8(payload: &[u8]) -> Result<String> {
    String::from_utf8(payload.to_vec()).map_err(|e| invalid(format!("string item is not UTF-8: {e}")))
}

fn fixed<const N: usize>(payload: &[u8]) -> Result<[u8; N]> {
    payload
        .get(..N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| invalid(format!("item shorter than {N} bytes")))
}

fn read_u32(data: &[u8], at: usize) -> Result<u32> {
    data.get(at..at.saturating_add(4))
        .map(le_u32)
        .ok_or_else(|| invalid(format!("read past end at offset {at}")))
}

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Builds well-formed bookmark blobs for tests
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    const HEADER_SIZE: u32 = 48;
    const VERSION: u32 = 0x1004_0000;

    pub(crate) struct BookmarkBuilder {
        body: Vec<u8>,
        entries: Vec<(u32, u32)>,
    }

    impl BookmarkBuilder {
        pub(crate) fn new() -> Self {
            // First word is the TOC offset, patched in build()
            Self { body: vec![0; 4], entries: Vec::new() }
        }

        pub(crate) fn next_offset(&self) -> u32 {
            self.body.len() as u32
        }

        pub(crate) fn item(&mut self, code: u32, payload: &[u8]) -> u32 {
            let offset = self.next_offset();
            self.body.extend((payload.len() as u32).to_le_bytes());
            self.body.extend(code.to_le_bytes());
            self.body.extend(payload);
            while self.body.len() % 4 != 0 {
                self.body.push(0);
            }
            offset
        }

        pub(crate) fn string(&mut self, value: &str) -> u32 {
            self.item(BMK_STRING, value.as_bytes())
        }

        pub(crate) fn array(&mut self, offsets: &[u32]) -> u32 {
            let payload: Vec<u8> = offsets.iter().flat_map(|o| o.to_le_bytes()).collect();
            self.item(BMK_ARRAY, &payload)
        }

        pub(crate) fn entry(&mut self, key: u32, offset: u32) {
            self.entries.push((key, offset));
        }

        pub(crate) fn path(mut self, components: &[&str]) -> Self {
            let offsets: Vec<u32> = components.iter().map(|c| self.string(c)).collect();
            let array = self.array(&offsets);
            self.entry(KEY_PATH, array);
            self
        }

        pub(crate) fn volume(mut self, name: &str, uuid: &str) -> Self {
            let name = self.string(name);
            self.entry(KEY_VOLUME_NAME, name);
            let uuid = self.string(uuid);
            self.entry(KEY_VOLUME_UUID, uuid);
            self
        }

        pub(crate) fn build(mut self) -> Vec<u8> {
            let toc_offset = self.next_offset();
            let count = self.entries.len() as u32;
            let toc_size = TOC_HEADER_SIZE as u32 + TOC_ENTRY_SIZE as u32 * count - 8;
            for word in [toc_size, TOC_MAGIC, 1, 0, count] {
                self.body.extend(word.to_le_bytes());
            }
            for (key, offset) in &self.entries {
                for word in [*key, *offset, 0] {
                    self.body.extend(word.to_le_bytes());
                }
            }
            self.body[0..4].copy_from_slice(&toc_offset.to_le_bytes());

            let total = HEADER_SIZE + self.body.len() as u32;
            let mut blob = Vec::with_capacity(total as usize);
            blob.extend(MAGIC_BOOK);
            blob.extend(total.to_le_bytes());
            blob.extend(VERSION.to_le_bytes());
            blob.extend(HEADER_SIZE.to_le_bytes());
            blob.resize(HEADER_SIZE as usize, 0);
            blob.extend(self.body);
            blob
        }
    }

    /// A minimal bookmark holding only a path
    pub(crate) fn path_bookmark(path: &str) -> Vec<u8> {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        BookmarkBuilder::new().path(&components).build()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{BookmarkBuilder, path_bookmark};
    use super::*;

    #[test]
    fn test_decode_path_components() {
        let blob = path_bookmark("/Volumes/Backup/Pictures/IMG_0001.JPG");
        let components = decode(&blob).unwrap();
        assert_eq!(components, vec!["Volumes", "Backup", "Pictures", "IMG_0001.JPG"]);
        assert_eq!(canonical_path(&components), "/Volumes/Backup/Pictures/IMG_0001.JPG");
    }

    #[test]
    fn test_decode_is_deterministic() {
        let blob = path_bookmark("/Users/alice/Pictures/img.jpg");
        assert_eq!(decode(&blob).unwrap(), decode(&blob).unwrap());
    }

    #[test]
    fn test_volume_metadata() {
        let blob = BookmarkBuilder::new()
            .path(&["Volumes", "Backup", "a.jpg"])
            .volume("Backup", "0F1E2D3C-0000-0000-0000-000000000000")
            .build();
        let bookmark = Bookmark::parse(&blob).unwrap();
        assert_eq!(bookmark.volume_name().unwrap().as_deref(), Some("Backup"));
        assert_eq!(
            bookmark.volume_uuid().unwrap().as_deref(),
            Some("0F1E2D3C-0000-0000-0000-000000000000")
        );
        assert_eq!(bookmark.volume_path().unwrap(), None);
    }

    #[test]
    fn test_missing_path_key_yields_no_components() {
        let blob = BookmarkBuilder::new().volume("Backup", "X").build();
        assert!(decode(&blob).unwrap().is_empty());
    }

    #[test]
    fn test_alis_magic_accepted() {
        let mut blob = path_bookmark("/a/b.jpg");
        blob[0..4].copy_from_slice(b"alis");
        assert_eq!(decode(&blob).unwrap(), vec!["a", "b.jpg"]);
    }

    #[test]
    fn test_rejects_bad_header() {
        assert!(matches!(decode(b"book"), Err(Error::InvalidBookmark(_))));

        let mut bad_magic = path_bookmark("/a/b.jpg");
        bad_magic[0..4].copy_from_slice(b"nope");
        assert!(matches!(decode(&bad_magic), Err(Error::InvalidBookmark(_))));

        let mut short_header = path_bookmark("/a/b.jpg");
        short_header[12..16].copy_from_slice(&8u32.to_le_bytes());
        assert!(matches!(decode(&short_header), Err(Error::InvalidBookmark(_))));
    }

    #[test]
    fn test_rejects_truncated_blob() {
        let mut blob = path_bookmark("/a/b.jpg");
        blob.pop();
        assert!(matches!(decode(&blob), Err(Error::InvalidBookmark(_))));
    }

    #[test]
    fn test_rejects_toc_offset_out_of_range() {
        let mut blob = path_bookmark("/a/b.jpg");
        let len = blob.len() as u32;
        blob[48..52].copy_from_slice(&len.to_le_bytes());
        assert!(matches!(decode(&blob), Err(Error::InvalidBookmark(_))));
    }

    #[test]
    fn test_rejects_zero_toc() {
        let mut blob = path_bookmark("/a/b.jpg");
        blob[48..52].copy_from_slice(&0u32.to_le_bytes());
        assert!(matches!(decode(&blob), Err(Error::InvalidBookmark(_))));
    }

    #[test]
    fn test_rejects_item_out_of_range() {
        let mut builder = BookmarkBuilder::new();
        builder.entry(KEY_PATH, 10_000);
        let blob = builder.build();
        assert!(matches!(decode(&blob), Err(Error::InvalidBookmark(_))));
    }

    #[test]
    fn test_rejects_self_referencing_array() {
        let mut builder = BookmarkBuilder::new();
        let own_offset = builder.next_offset();
        let array = builder.array(&[own_offset]);
        assert_eq!(array, own_offset);
        builder.entry(KEY_PATH, array);
        let blob = builder.build();
        assert!(matches!(decode(&blob), Err(Error::InvalidBookmark(_))));
    }

    #[test]
    fn test_non_string_component_is_invalid() {
        let mut builder = BookmarkBuilder::new();
        let number = builder.item(BMK_NUMBER | NUMBER_SINT32, &7i32.to_le_bytes());
        let array = builder.array(&[number]);
        builder.entry(KEY_PATH, array);
        let blob = builder.build();
        assert!(matches!(decode(&blob), Err(Error::InvalidBookmark(_))));
    }

    #[test]
    fn test_named_keys_and_typed_items() {
        let mut builder = BookmarkBuilder::new();
        let name = builder.string("NSURLDocumentIdentifierKey");
        let number = builder.item(BMK_NUMBER | NUMBER_SINT64, &42i64.to_le_bytes());
        builder.entry(NAMED_KEY_FLAG | name, number);
        let flag = builder.item(BMK_BOOLEAN | BOOLEAN_TRUE, &[]);
        builder.entry(0xD010, flag);
        let url = builder.item(BMK_URL | URL_ABSOLUTE, b"file:///Volumes/Backup/");
        builder.entry(KEY_VOLUME_PATH, url);
        let blob = builder.build();

        let bookmark = Bookmark::parse(&blob).unwrap();
        assert!(bookmark.tocs()[0]
            .keys()
            .any(|k| *k == TocKey::Name("NSURLDocumentIdentifierKey".to_string())));
        assert_eq!(
            bookmark.get_named("NSURLDocumentIdentifierKey").unwrap(),
            Some(BookmarkValue::Integer(42))
        );
        assert_eq!(bookmark.get(0xD010).unwrap(), Some(BookmarkValue::Boolean(true)));
        assert_eq!(bookmark.volume_path().unwrap().as_deref(), Some("file:///Volumes/Backup/"));
        assert_eq!(bookmark.get(0xBEEF).unwrap(), None);
    }

    /// Array levels that each reference the level below twice
    fn fan_out(builder: &mut BookmarkBuilder, levels: usize) -> u32 {
        let mut inner = builder.string("leaf");
        for _ in 0..levels {
            inner = builder.array(&[inner, inner]);
        }
        inner
    }

    #[test]
    fn test_unused_fan_out_is_not_decoded() {
        let mut builder = BookmarkBuilder::new();
        let root = fan_out(&mut builder, 30);
        builder.entry(0xF000, root);
        let empty_path = builder.array(&[]);
        builder.entry(KEY_PATH, empty_path);
        let blob = builder.build();

        let bookmark = Bookmark::parse(&blob).unwrap();
        assert!(bookmark.path_components().unwrap().is_empty());
        assert!(matches!(bookmark.get(0xF000), Err(Error::InvalidBookmark(_))));
    }

    #[test]
    fn test_fan_out_path_is_rejected() {
        let mut builder = BookmarkBuilder::new();
        let root = fan_out(&mut builder, 30);
        builder.entry(KEY_PATH, root);
        let blob = builder.build();
        assert!(blob.len() < 1024);
        assert!(matches!(decode(&blob), Err(Error::InvalidBookmark(_))));
    }

    #[test]
    fn test_shared_items_within_budget_decode() {
        let mut builder = BookmarkBuilder::new();
        let component = builder.string("Pictures");
        let array = builder.array(&[component, component]);
        builder.entry(KEY_PATH, array);
        let blob = builder.build();
        assert_eq!(decode(&blob).unwrap(), vec!["Pictures", "Pictures"]);
    }
}
