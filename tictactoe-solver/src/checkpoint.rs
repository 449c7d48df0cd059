//! Binary tablebase format.
//!
//! Format:
//! - Header (32 bytes):
//!   - Magic: "TTT1" (4 bytes)
//!   - Version: u32 LE (4 bytes)
//!   - Entry count: u64 LE (8 bytes)
//!   - Checksum: u64 LE xxhash of data section (8 bytes)
//!   - Flags: u8 (bit 0 set when the table is partial, from a pruned solve)
//!   - Reserved: 7 bytes (zeros)
//! - Data section (entry_count × 5 bytes):
//!   - Canonical board: u32 LE (4 bytes)
//!   - Outcome: i8 (1 byte), 1 X wins, 0 draw, -1 O wins
//!
//! Entries are sorted by canonical board; [`Checkpoint::lookup`] binary searches them.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use xxhash_rust::xxh64::xxh64;

const MAGIC: &[u8; 4] = b"TTT1";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 32;
const ENTRY_SIZE: usize = 5;

/// Set when the table holds only the positions a pruned solve visited.
const FLAG_PARTIAL: u8 = 1;

/// Upper bound on entries: one per 2-bit encoding of nine cells.
const MAX_ENTRIES: u64 = 1 << 18;

fn invalid(msg: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.into())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    pub entries: Vec<(u32, i8)>,
    /// Written by a pruned solve: every entry is exact but positions are missing
    pub partial: bool,
}

impl Checkpoint {
    /// Build a checkpoint from a solved table, sorted by board.
    pub fn from_table(table: &HashMap<u32, i8>, partial: bool) -> Self {
        let mut entries: Vec<(u32, i8)> = table.iter().map(|(&k, &v)| (k, v)).collect();
        entries.sort_unstable_by_key(|&(k, _)| k);
        Checkpoint { entries, partial }
    }

    /// Perfect-play outcome of a canonical board, if present.
    pub fn lookup(&self, canonical: u32) -> Option<i8> {
        self.entries
            .binary_search_by_key(&canonical, |&(k, _)| k)
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> io::Result<()> {
        let mut data = Vec::with_capacity(self.entries.len() * ENTRY_SIZE);
        for (canonical, outcome) in &self.entries {
            data.extend_from_slice(&canonical.to_le_bytes());
            data.push(*outcome as u8);
        }
        let checksum = xxh64(&data, 0);

        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&(self.entries.len() as u64).to_le_bytes())?;
        writer.write_all(&checksum.to_le_bytes())?;
        let flags = if self.partial { FLAG_PARTIAL } else { 0 };
        writer.write_all(&[flags])?;
        writer.write_all(&[0u8; 7])?; // Reserved
        writer.write_all(&data)?;
        writer.flush()
    }

    pub fn read_from<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let (magic, rest) = header.split_at(4);
        if magic != MAGIC {
            return Err(invalid("Invalid tablebase magic"));
        }

        let (version, rest) = split_u32(rest);
        if version != VERSION {
            return Err(invalid(format!("Unsupported tablebase version: {}", version)));
        }

        let (count, rest) = split_u64(rest);
        let (stored_checksum, rest) = split_u64(rest);
        let flags = rest[0];
        if flags & !FLAG_PARTIAL != 0 {
            return Err(invalid(format!("Unknown tablebase flags: {:#04x}", flags)));
        }
        if count > MAX_ENTRIES {
            return Err(invalid(format!("Implausible entry count: {}", count)));
        }

        let mut data = vec![0u8; count as usize * ENTRY_SIZE];
        reader.read_exact(&mut data)?;

        if xxh64(&data, 0) != stored_checksum {
            return Err(invalid("Tablebase checksum mismatch"));
        }

        let entries = data
            .chunks_exact(ENTRY_SIZE)
            .map(|chunk| {
                let (canonical, outcome) = split_u32(chunk);
                (canonical, outcome[0] as i8)
            })
            .collect();

        Ok(Checkpoint {
            entries,
            partial: flags & FLAG_PARTIAL != 0,
        })
    }

    /// Save a solved table. Returns the number of entries written.
    pub fn save(path: &Path, table: &HashMap<u32, i8>, partial: bool) -> io::Result<usize> {
        let checkpoint = Self::from_table(table, partial);
        let file = File::create(path)?;
        checkpoint.write_to(BufWriter::new(file))?;
        Ok(checkpoint.entries.len())
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::read_from(BufReader::new(file))
    }

    /// File size for a given number of entries.
    pub fn estimate_size(count: usize) -> usize {
        HEADER_SIZE + count * ENTRY_SIZE
    }
}

// Callers slice from fixed-size buffers, so the lengths always fit.
fn split_u32(bytes: &[u8]) -> (u32, &[u8]) {
    let (head, rest) = bytes.split_at(4);
    let mut buf = [0u8; 4];
    buf.copy_from_slice(head);
    (u32::from_le_bytes(buf), rest)
}

fn split_u64(bytes: &[u8]) -> (u64, &[u8]) {
    let (head, rest) = bytes.split_at(8);
    let mut buf = [0u8; 8];
    buf.copy_from_slice(head);
    (u64::from_le_bytes(buf), rest)
}
