//! Utility functions and structures.

use std::fs::{self, File};
use std::path::Path;
use std::io::{self, BufRead, BufReader, Read, Write};

use flate2::read::MultiGzDecoder;

//-----------------------------------------------------------------------------

// Utilities for working with files.

const SIZE_UNITS: [(f64, &str); 6] = [
    (1.0, "B"),
    (1024.0, "KiB"),
    (1024.0 * 1024.0, "MiB"),
    (1024.0 * 1024.0 * 1024.0, "GiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0, "TiB"),
    (1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0, "PiB"),
];

/// Returns a human-readable representation of the given number of bytes.
pub fn human_readable_size(bytes: usize) -> String {
    let mut unit = 0;
    let value = bytes as f64;
    while unit + 1 < SIZE_UNITS.len() && value >= SIZE_UNITS[unit + 1].0 {
        unit += 1;
    }
    format!("{:.3} {}", value / SIZE_UNITS[unit].0, SIZE_UNITS[unit].1)
}

/// Returns a human-readable size of the file.
pub fn file_size<P: AsRef<Path>>(filename: P) -> Option<String> {
    let metadata = fs::metadata(filename).ok()?;
    Some(human_readable_size(metadata.len() as usize))
}

/// Returns `true` if the file exists.
pub fn file_exists<P: AsRef<Path>>(filename: P) -> bool {
    fs::metadata(filename).is_ok()
}

/// Returns `true` if the file appears to be gzip-compressed.
pub fn is_gzipped<P: AsRef<Path>>(filename: P) -> bool {
    let file = match File::open(filename) {
        Ok(file) => file,
        Err(_) => return false,
    };
    let mut reader = BufReader::new(file);
    let mut magic = [0; 2];
    let len = reader.read(&mut magic).ok();
    len == Some(2) && magic == [0x1F, 0x8B]
}

/// Returns a buffered reader for the file, which may be gzip-compressed.
pub fn open_file<P: AsRef<Path>>(filename: P) -> Result<Box<dyn BufRead>, String> {
    let file = File::open(&filename).map_err(|x| format!("Cannot open {}: {}", filename.as_ref().display(), x))?;
    let inner = BufReader::new(file);
    if is_gzipped(&filename) {
        let inner = MultiGzDecoder::new(inner);
        Ok(Box::new(BufReader::new(inner)))
    } else {
        Ok(Box::new(inner))
    }
}

/// Reads the lines of a text file (possibly gzip-compressed), skipping empty lines.
pub fn read_lines<P: AsRef<Path>>(filename: P) -> Result<Vec<String>, String> {
    let reader = open_file(&filename)?;
    let mut result = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|x| x.to_string())?;
        let line = line.trim_end();
        if !line.is_empty() {
            result.push(line.to_string());
        }
    }
    Ok(result)
}

//-----------------------------------------------------------------------------

// Aligned sequences.

/// Gap character in the multiple sequence alignment.
pub const GAP: u8 = b'-';

/// Appends the non-gap characters of `aligned` to `buffer`.
pub fn remove_gaps(aligned: &[u8], buffer: &mut Vec<u8>) {
    buffer.extend(aligned.iter().copied().filter(|&c| c != GAP));
}

//-----------------------------------------------------------------------------

// Scalar fields in serialized structures.

/// Writes an integer as a little-endian 64-bit word.
pub fn write_u64<W: Write>(writer: &mut W, value: usize) -> io::Result<()> {
    writer.write_all(&(value as u64).to_le_bytes())
}

/// Reads an integer stored as a little-endian 64-bit word.
pub fn read_u64<R: Read>(reader: &mut R) -> io::Result<usize> {
    let mut bytes = [0u8; 8];
    reader.read_exact(&mut bytes)?;
    Ok(u64::from_le_bytes(bytes) as usize)
}

//-----------------------------------------------------------------------------


//-----------------------------------------------------------------------------
