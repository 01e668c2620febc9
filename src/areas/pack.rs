//! Packed objects
//!
//! `git gc`, `git clone` and `git fetch` store objects in packfiles under
//! `.git/objects/pack`. Every `pack-<sha>.pack` comes with a `pack-<sha>.idx`
//! index mapping object ids to offsets in the pack.
//!
//! ## Index format (version 2)
//!
//! ```text
//! \377tOc | version | fanout[256] | ids[n] | crc32[n] | offsets[n] | large offsets[m] | trailer
//! ```
//!
//! `fanout[b]` counts the ids whose first byte is at most `b`; ids are sorted.
//! An offset with its high bit set indexes the table of 64-bit offsets.
//!
//! ## Entry format
//!
//! ```text
//! type + inflated size (varint) | [base offset or base id] | zlib data
//! ```
//!
//! Deltified entries (`OFS_DELTA`, `REF_DELTA`) are rebuilt from their base
//! object by applying copy and insert instructions.

use crate::artifacts::objects::RAW_OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::{Buf, Bytes};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

const INDEX_SIGNATURE: [u8; 4] = [0xff, b't', b'O', b'c'];
const INDEX_VERSION: u32 = 2;
const FANOUT_ENTRIES: usize = 256;
const LARGE_OFFSET_FLAG: u32 = 0x8000_0000;

const PACK_SIGNATURE: &[u8; 4] = b"PACK";
const PACK_HEADER_LENGTH: usize = 12;

/// Delta chains longer than this are treated as corrupt
const MAX_DELTA_CHAIN: usize = 4096;
/// Upper bound for buffers preallocated from sizes read off disk
const MAX_PREALLOCATION: usize = 1 << 20;

type RawObjectId = [u8; RAW_OBJECT_ID_LENGTH];

/// Where an entry's content comes from
#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryKind {
    Whole(ObjectType),
    /// Delta against the entry at this offset of the same pack
    OffsetDelta(u64),
    /// Delta against the object with this id
    RefDelta(RawObjectId),
}

#[derive(Debug)]
struct PackEntry {
    kind: EntryKind,
    data: Bytes,
}

/// Version 2 pack index: sorted object ids and their pack offsets
#[derive(Debug)]
struct PackIndex {
    fanout: Vec<u32>,
    ids: Vec<RawObjectId>,
    offsets: Vec<u64>,
}

impl PackIndex {
    fn parse(data: &[u8]) -> anyhow::Result<Self> {
        let mut buf = data;
        if buf.remaining() < 8 + FANOUT_ENTRIES * 4 {
            anyhow::bail!("truncated pack index header");
        }

        let mut signature = [0; 4];
        buf.copy_to_slice(&mut signature);
        if signature != INDEX_SIGNATURE {
            anyhow::bail!("unsupported pack index format, only version 2 is read");
        }
        let version = buf.get_u32();
        if version != INDEX_VERSION {
            anyhow::bail!("unsupported pack index version {version}");
        }

        let fanout = (0..FANOUT_ENTRIES)
            .map(|_| buf.get_u32())
            .collect::<Vec<_>>();
        if fanout.windows(2).any(|pair| pair[0] > pair[1]) {
            anyhow::bail!("corrupt pack index fanout");
        }

        let count = fanout[FANOUT_ENTRIES - 1] as usize;
        let tables_length = count
            .checked_mul(RAW_OBJECT_ID_LENGTH + 4 + 4)
            .context("pack index too large")?;
        if buf.remaining() < tables_length {
            anyhow::bail!("truncated pack index: {count} objects announced");
        }

        let ids = (0..count)
            .map(|_| {
                let mut id = [0; RAW_OBJECT_ID_LENGTH];
                buf.copy_to_slice(&mut id);
                id
            })
            .collect::<Vec<_>>();
        // crc32 of every entry, not verified when reading
        buf.advance(count * 4);
        let small_offsets = (0..count).map(|_| buf.get_u32()).collect::<Vec<_>>();

        let large_count = small_offsets
            .iter()
            .filter(|offset| *offset & LARGE_OFFSET_FLAG != 0)
            .count();
        if buf.remaining() < large_count * 8 {
            anyhow::bail!("truncated pack index large offset table");
        }
        let large_offsets = (0..large_count).map(|_| buf.get_u64()).collect::<Vec<_>>();

        let offsets = small_offsets
            .into_iter()
            .map(|offset| {
                if offset & LARGE_OFFSET_FLAG == 0 {
                    Ok(offset as u64)
                } else {
                    large_offsets
                        .get((offset & !LARGE_OFFSET_FLAG) as usize)
                        .copied()
                        .context("corrupt pack index: large offset out of range")
                }
            })
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(PackIndex {
            fanout,
            ids,
            offsets,
        })
    }

    fn offset_of(&self, id: &RawObjectId) -> Option<u64> {
        let first = id[0] as usize;
        let start = match first {
            0 => 0,
            _ => self.fanout[first - 1] as usize,
        };
        let end = self.fanout[first] as usize;

        self.ids[start..end]
            .binary_search(id)
            .ok()
            .map(|position| self.offsets[start + position])
    }
}

/// A packfile and its index
#[derive(Debug)]
pub struct PackFile {
    index_path: PathBuf,
    pack_path: PathBuf,
    index: PackIndex,
}

impl PackFile {
    /// Load the index at `index_path`; the pack itself is read on demand
    pub fn open(index_path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(index_path)
            .with_context(|| format!("Unable to read pack index {}", index_path.display()))?;
        let index = PackIndex::parse(&data)
            .with_context(|| format!("Invalid pack index {}", index_path.display()))?;

        Ok(PackFile {
            index_path: index_path.to_path_buf(),
            pack_path: index_path.with_extension("pack"),
            index,
        })
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn object_count(&self) -> usize {
        self.index.ids.len()
    }

    /// Read an object's type and body, `None` when the pack does not hold it
    pub fn read_object(&self, object_id: &ObjectId) -> anyhow::Result<Option<(ObjectType, Bytes)>> {
        let Some(offset) = self.index.offset_of(&object_id.to_raw_bytes()) else {
            return Ok(None);
        };

        let mut file = File::open(&self.pack_path)
            .with_context(|| format!("Unable to open pack {}", self.pack_path.display()))?;
        Self::check_header(&mut file)
            .with_context(|| format!("Invalid pack {}", self.pack_path.display()))?;

        self.read_at(&mut file, offset).map(Some).with_context(|| {
            format!(
                "Unable to read object {object_id} from pack {}",
                self.pack_path.display()
            )
        })
    }

    fn check_header(file: &mut File) -> anyhow::Result<()> {
        let mut header = [0; PACK_HEADER_LENGTH];
        file.read_exact(&mut header)?;

        let mut buf = &header[..];
        let mut signature = [0; 4];
        buf.copy_to_slice(&mut signature);
        if &signature != PACK_SIGNATURE {
            anyhow::bail!("missing pack signature");
        }
        match buf.get_u32() {
            2 | 3 => Ok(()),
            version => anyhow::bail!("unsupported pack version {version}"),
        }
    }

    /// Rebuild the object stored at `offset`, following its delta chain
    fn read_at(&self, file: &mut File, offset: u64) -> anyhow::Result<(ObjectType, Bytes)> {
        let mut deltas = Vec::new();
        let mut offset = offset;

        let (object_type, mut data) = loop {
            if deltas.len() > MAX_DELTA_CHAIN {
                anyhow::bail!("delta chain longer than {MAX_DELTA_CHAIN} at offset {offset}");
            }

            let entry = read_entry(file, offset)?;
            match entry.kind {
                EntryKind::Whole(object_type) => break (object_type, entry.data),
                EntryKind::OffsetDelta(base_offset) => {
                    deltas.push(entry.data);
                    offset = base_offset;
                }
                EntryKind::RefDelta(base_id) => {
                    deltas.push(entry.data);
                    offset = self
                        .index
                        .offset_of(&base_id)
                        .context("delta base is not in the same pack")?;
                }
            }
        };

        for delta in deltas.iter().rev() {
            data = apply_delta(&data, delta)?;
        }

        Ok((object_type, data))
    }
}

fn read_entry(file: &mut File, offset: u64) -> anyhow::Result<PackEntry> {
    file.seek(SeekFrom::Start(offset))?;
    let mut reader = BufReader::new(file);

    let mut byte = read_byte(&mut reader)?;
    let type_code = (byte >> 4) & 0b111;
    let mut size = (byte & 0x0f) as u64;
    let mut shift = 4;
    while byte & 0x80 != 0 {
        if shift > 57 {
            anyhow::bail!("entry size overflow at offset {offset}");
        }
        byte = read_byte(&mut reader)?;
        size |= ((byte & 0x7f) as u64) << shift;
        shift += 7;
    }

    let kind = match type_code {
        1 => EntryKind::Whole(ObjectType::Commit),
        2 => EntryKind::Whole(ObjectType::Tree),
        3 => EntryKind::Whole(ObjectType::Blob),
        4 => EntryKind::Whole(ObjectType::Tag),
        6 => {
            let distance = read_offset_distance(&mut reader)?;
            let base_offset = offset
                .checked_sub(distance)
                .filter(|_| distance > 0)
                .with_context(|| format!("delta base out of pack bounds at offset {offset}"))?;
            EntryKind::OffsetDelta(base_offset)
        }
        7 => {
            let mut base_id = [0; RAW_OBJECT_ID_LENGTH];
            reader.read_exact(&mut base_id)?;
            EntryKind::RefDelta(base_id)
        }
        other => anyhow::bail!("unknown pack entry type {other} at offset {offset}"),
    };

    Ok(PackEntry {
        kind,
        data: inflate(reader, size)?,
    })
}

fn read_byte(reader: &mut impl Read) -> anyhow::Result<u8> {
    let mut byte = [0; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

/// Distance back to an `OFS_DELTA` base: big-endian base-128 where every
/// continuation adds one
fn read_offset_distance(reader: &mut impl Read) -> anyhow::Result<u64> {
    let mut byte = read_byte(reader)?;
    let mut distance = (byte & 0x7f) as u64;

    while byte & 0x80 != 0 {
        if distance > u64::MAX >> 8 {
            anyhow::bail!("delta base offset overflow");
        }
        byte = read_byte(reader)?;
        distance = ((distance + 1) << 7) | (byte & 0x7f) as u64;
    }

    Ok(distance)
}

fn inflate(reader: impl BufRead, size: u64) -> anyhow::Result<Bytes> {
    let mut decoder = flate2::bufread::ZlibDecoder::new(reader);
    let mut data = Vec::with_capacity((size as usize).min(MAX_PREALLOCATION));

    decoder
        .by_ref()
        .take(size.saturating_add(1))
        .read_to_end(&mut data)
        .context("Unable to decompress pack entry")?;
    if data.len() as u64 != size {
        anyhow::bail!(
            "pack entry inflated to {} bytes, {size} announced",
            data.len()
        );
    }

    Ok(data.into())
}

/// Delta sizes: little-endian base-128
fn read_delta_size(delta: &mut &[u8]) -> anyhow::Result<u64> {
    let mut size = 0u64;
    let mut shift = 0;

    loop {
        if !delta.has_remaining() {
            anyhow::bail!("truncated delta header");
        }
        if shift > 63 {
            anyhow::bail!("delta size overflow");
        }
        let byte = delta.get_u8();
        size |= ((byte & 0x7f) as u64) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            return Ok(size);
        }
    }
}

fn next_delta_byte(delta: &mut &[u8]) -> anyhow::Result<u8> {
    if !delta.has_remaining() {
        anyhow::bail!("truncated delta instruction");
    }
    Ok(delta.get_u8())
}

/// Rebuild an object from its base and a delta
///
/// An instruction with the high bit set copies a range of the base (offset
/// and size bytes present per the low seven bits, a size of zero meaning
/// 0x10000); otherwise it inserts the next `n` bytes of the delta.
pub fn apply_delta(base: &[u8], delta: &[u8]) -> anyhow::Result<Bytes> {
    let mut delta = delta;

    let base_size = read_delta_size(&mut delta)?;
    if base_size != base.len() as u64 {
        anyhow::bail!(
            "delta expects a base of {base_size} bytes, found {}",
            base.len()
        );
    }
    let result_size = read_delta_size(&mut delta)?;
    let mut result = Vec::with_capacity((result_size as usize).min(MAX_PREALLOCATION));

    while delta.has_remaining() {
        let instruction = delta.get_u8();

        if instruction & 0x80 != 0 {
            let mut copy_offset = 0u64;
            for (position, flag) in [0x01, 0x02, 0x04, 0x08].into_iter().enumerate() {
                if instruction & flag != 0 {
                    copy_offset |= (next_delta_byte(&mut delta)? as u64) << (8 * position);
                }
            }
            let mut copy_size = 0u64;
            for (position, flag) in [0x10, 0x20, 0x40].into_iter().enumerate() {
                if instruction & flag != 0 {
                    copy_size |= (next_delta_byte(&mut delta)? as u64) << (8 * position);
                }
            }
            if copy_size == 0 {
                copy_size = 0x10000;
            }

            let copy_end = copy_offset
                .checked_add(copy_size)
                .filter(|end| *end <= base.len() as u64)
                .context("delta copies past the end of its base")?;
            result.extend_from_slice(&base[copy_offset as usize..copy_end as usize]);
        } else if instruction != 0 {
            let length = instruction as usize;
            if delta.remaining() < length {
                anyhow::bail!("truncated delta insert");
            }
            result.extend_from_slice(&delta[..length]);
            delta.advance(length);
        } else {
            anyhow::bail!("reserved delta instruction 0");
        }
    }

    if result.len() as u64 != result_size {
        anyhow::bail!(
            "delta produced {} bytes, {result_size} announced",
            result.len()
        );
    }

    Ok(result.into())
}
