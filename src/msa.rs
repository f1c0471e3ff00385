//! Readers for multiple sequence alignments and block segmentations.
//!
//! An MSA is given as a set of aligned sequences of equal length, one sequence per file.
//! Readers provide access to column ranges of all sequences at once.
//! A segmentation is a sequence of block right bounds in alignment coordinates.

use crate::utils;

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;


//-----------------------------------------------------------------------------

/// Random access to column ranges of a multiple sequence alignment.
///
/// The typical usage is to add the files, call [`MsaReader::prepare`], and then read column ranges with [`MsaReader::fill_buffer`].
pub trait MsaReader {
    /// Adds a file containing one aligned sequence.
    fn add_file(&mut self, filename: &Path) -> Result<(), String>;

    /// Prepares the reader for [`MsaReader::fill_buffer`] calls after all files have been added.
    fn prepare(&mut self) -> Result<(), String>;

    /// Calls `callback` with the characters in columns `lb..rb` of each sequence.
    ///
    /// The slices are in the same order as the sequences were added.
    fn fill_buffer<F>(&mut self, lb: usize, rb: usize, callback: F) -> Result<(), String>
        where F: FnMut(&[&[u8]]) -> Result<(), String>;

    /// Returns the length of the aligned sequences.
    fn aligned_size(&self) -> usize;

    /// Returns the number of aligned sequences.
    fn handle_count(&self) -> usize;
}

/// Adds the files listed in `list_file` (one path per line) to the reader.
pub fn add_files_from_list<R: MsaReader, P: AsRef<Path>>(reader: &mut R, list_file: P) -> Result<usize, String> {
    let paths = utils::read_lines(list_file)?;
    for path in paths.iter() {
        reader.add_file(Path::new(path))?;
    }
    Ok(paths.len())
}

fn check_range(lb: usize, rb: usize, aligned_size: usize) -> Result<(), String> {
    if lb > rb || rb > aligned_size {
        return Err(format!("Invalid column range {}..{} for aligned size {}", lb, rb, aligned_size));
    }
    Ok(())
}

//-----------------------------------------------------------------------------

/// An MSA reader for uncompressed text files.
///
/// Each file contains exactly one aligned sequence without line breaks.
/// A single trailing newline is ignored.
/// Column ranges are read with seeks, so the sequences are never fully loaded into memory.
#[derive(Debug, Default)]
pub struct TextMsaReader {
    files: Vec<File>,
    buffers: Vec<Vec<u8>>,
    aligned_size: usize,
}

impl TextMsaReader {
    /// Creates an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    fn aligned_length(file: &mut File) -> Result<usize, String> {
        let len = file.metadata().map_err(|x| x.to_string())?.len() as usize;
        if len == 0 {
            return Ok(0);
        }
        file.seek(SeekFrom::Start(len as u64 - 1)).map_err(|x| x.to_string())?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).map_err(|x| x.to_string())?;
        Ok(if last[0] == b'\n' { len - 1 } else { len })
    }
}

impl MsaReader for TextMsaReader {
    fn add_file(&mut self, filename: &Path) -> Result<(), String> {
        let mut file = File::open(filename).map_err(|x| format!("Cannot open {}: {}", filename.display(), x))?;
        let len = Self::aligned_length(&mut file)?;
        if self.files.is_empty() {
            self.aligned_size = len;
        } else if len != self.aligned_size {
            return Err(format!("Aligned sequence {} has length {}, expected {}", filename.display(), len, self.aligned_size));
        }
        self.files.push(file);
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), String> {
        self.buffers = vec![Vec::new(); self.files.len()];
        Ok(())
    }

    fn fill_buffer<F>(&mut self, lb: usize, rb: usize, mut callback: F) -> Result<(), String>
        where F: FnMut(&[&[u8]]) -> Result<(), String>
    {
        check_range(lb, rb, self.aligned_size)?;
        if self.buffers.len() != self.files.len() {
            return Err(String::from("TextMsaReader::prepare() has not been called"));
        }
        for (file, buffer) in self.files.iter_mut().zip(self.buffers.iter_mut()) {
            buffer.resize(rb - lb, 0);
            file.seek(SeekFrom::Start(lb as u64)).map_err(|x| x.to_string())?;
            file.read_exact(buffer).map_err(|x| x.to_string())?;
        }
        let spans: Vec<&[u8]> = self.buffers.iter().map(|x| x.as_slice()).collect();
        callback(&spans)
    }

    fn aligned_size(&self) -> usize {
        self.aligned_size
    }

    fn handle_count(&self) -> usize {
        self.files.len()
    }
}

//-----------------------------------------------------------------------------

/// An MSA reader that keeps the aligned sequences in memory.
///
/// Files may be gzip-compressed.
/// Sequences can also be added directly with [`InMemoryMsaReader::add_sequence`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InMemoryMsaReader {
    sequences: Vec<Vec<u8>>,
}

impl InMemoryMsaReader {
    /// Creates an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a reader for the given aligned sequences.
    pub fn from_sequences<T: AsRef<[u8]>>(sequences: &[T]) -> Self {
        InMemoryMsaReader {
            sequences: sequences.iter().map(|x| x.as_ref().to_vec()).collect(),
        }
    }

    /// Adds an aligned sequence.
    pub fn add_sequence(&mut self, sequence: Vec<u8>) {
        self.sequences.push(sequence);
    }
}

impl MsaReader for InMemoryMsaReader {
    fn add_file(&mut self, filename: &Path) -> Result<(), String> {
        let mut reader = utils::open_file(filename)?;
        let mut sequence = Vec::new();
        reader.read_to_end(&mut sequence).map_err(|x| x.to_string())?;
        if sequence.last() == Some(&b'\n') {
            sequence.pop();
        }
        self.sequences.push(sequence);
        Ok(())
    }

    fn prepare(&mut self) -> Result<(), String> {
        let len = self.aligned_size();
        for (i, sequence) in self.sequences.iter().enumerate() {
            if sequence.len() != len {
                return Err(format!("Aligned sequence {} has length {}, expected {}", i, sequence.len(), len));
            }
        }
        Ok(())
    }

    fn fill_buffer<F>(&mut self, lb: usize, rb: usize, mut callback: F) -> Result<(), String>
        where F: FnMut(&[&[u8]]) -> Result<(), String>
    {
        check_range(lb, rb, self.aligned_size())?;
        let spans: Vec<&[u8]> = self.sequences.iter().map(|x| &x[lb..rb]).collect();
        callback(&spans)
    }

    fn aligned_size(&self) -> usize {
        self.sequences.first().map(|x| x.len()).unwrap_or(0)
    }

    fn handle_count(&self) -> usize {
        self.sequences.len()
    }
}

//-----------------------------------------------------------------------------

/// Reads a block segmentation from a text file.
///
/// The file contains whitespace-separated right bounds of the blocks.
/// The bounds must be positive and strictly increasing.
pub fn read_segmentation<P: AsRef<Path>>(filename: P) -> Result<Vec<usize>, String> {
    let mut reader = utils::open_file(&filename)?;
    let mut contents = String::new();
    reader.read_to_string(&mut contents).map_err(|x| x.to_string())?;
    parse_segmentation(&contents)
}

/// Parses a block segmentation from a string.
///
/// See [`read_segmentation`] for the format.
pub fn parse_segmentation(contents: &str) -> Result<Vec<usize>, String> {
    let mut result: Vec<usize> = Vec::new();
    for token in contents.split_whitespace() {
        let rb = token.parse::<usize>().map_err(|x| format!("Invalid block bound {}: {}", token, x))?;
        let lb = result.last().copied().unwrap_or(0);
        if rb <= lb {
            return Err(format!("Block bound {} does not exceed the previous bound {}", rb, lb));
        }
        result.push(rb);
    }
    Ok(result)
}

//-----------------------------------------------------------------------------
