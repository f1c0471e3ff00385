//! A suffix array index supporting backward search over a byte text.
//!
//! [`Csa`] is an FM-index that stores the Burrows-Wheeler transform as one rank-enabled bitvector per symbol.
//! The text is implicitly terminated by an endmarker that is smaller than any byte value.
//! The endmarker is not a part of the alphabet and it cannot be searched for.
//!
//! A co-lexicographic index is a [`Csa`] for the reverse text (see [`Csa::new_reverse`]).
//! Extending a pattern to the right in the forward text corresponds to backward search in the reverse index.
//! The `forward_search` methods in this module perform such extensions.
//!
//! Ranges of suffix array rows are represented as half-open intervals ([`LexRange`]).
//! [`RangePair`] combines the lexicographic and the co-lexicographic range of the same pattern.

use crate::utils;

use simple_sds::bit_vector::BitVector;
use simple_sds::ops::{BitVec, Rank};
use simple_sds::raw_vector::{RawVector, AccessRaw};
use simple_sds::serialize::Serialize;

use std::io;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// A range of suffix array rows.
///
/// The range consists of rows `start..end`.
/// Lexicographic ranges of patterns are nested: if `x` is a prefix of `y`, the range of `y` is contained in the range of `x`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct LexRange {
    /// First row in the range.
    pub start: usize,
    /// One past the last row in the range.
    pub end: usize,
}

impl LexRange {
    /// Creates a new range.
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        LexRange { start, end }
    }

    /// Returns the left bound (the first row).
    #[inline]
    pub fn lb(&self) -> usize {
        self.start
    }

    /// Returns the right bound (the last row) of a nonempty range.
    #[inline]
    pub fn rb(&self) -> usize {
        self.end.saturating_sub(1)
    }

    /// Returns the number of rows in the range.
    #[inline]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the range is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns `true` if the range contains exactly one row.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.len() == 1
    }

    /// Returns `true` if this range is contained in the given range.
    ///
    /// For the range of a pattern, this is the case when the pattern has the pattern of `other` as a prefix.
    #[inline]
    pub fn has_prefix(&self, other: &LexRange) -> bool {
        !self.is_empty() && other.start <= self.start && self.end <= other.end
    }
}

//-----------------------------------------------------------------------------

/// An FM-index for a byte text.
///
/// The suffix array is built with `libdivsufsort`.
/// Row 0 always corresponds to the suffix consisting of the endmarker.
///
/// # Examples
///
/// ```
/// use founder_graph_index::Csa;
///
/// let csa = Csa::new(b"#AC#AG#").unwrap();
/// assert_eq!(csa.size(), 8);
/// assert_eq!(csa.alphabet(), b"#ACG");
///
/// let range = csa.find(b"A");
/// assert_eq!(range.len(), 2);
/// let range = csa.backward_search_str(csa.full_range(), b"C#");
/// assert!(range.is_singleton());
/// assert!(csa.find(b"CA").is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Csa {
    // Text length including the endmarker.
    size: usize,

    // Distinct bytes of the text in sorted order.
    alphabet: Vec<u8>,

    // Rank of each byte value in the alphabet, or `NO_SYMBOL`.
    symbol_ranks: Vec<usize>,

    // Number of rows before the first row starting with each symbol.
    counts: Vec<usize>,

    // For each symbol, the positions of the symbol in the BWT.
    bwt: Vec<BitVector>,
}

const NO_SYMBOL: usize = usize::MAX;

impl Csa {
    /// Builds the index for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is too long for the 32-bit suffix array construction.
    pub fn new(text: &[u8]) -> Result<Self, String> {
        if text.len() >= i32::MAX as usize {
            return Err(format!("Text length {} exceeds the suffix array construction limit", text.len()));
        }
        let sa = if text.is_empty() {
            Vec::new()
        } else {
            libdivsufsort_rs::divsufsort(text).ok_or_else(|| String::from("Suffix array construction failed"))?
        };
        let size = text.len() + 1;

        let mut occurrences = vec![0usize; 256];
        for &c in text.iter() {
            occurrences[c as usize] += 1;
        }
        let mut alphabet: Vec<u8> = Vec::new();
        let mut symbol_ranks = vec![NO_SYMBOL; 256];
        let mut counts: Vec<usize> = Vec::new();
        let mut total = 1;
        for (c, &occs) in occurrences.iter().enumerate() {
            if occs > 0 {
                symbol_ranks[c] = alphabet.len();
                alphabet.push(c as u8);
                counts.push(total);
                total += occs;
            }
        }

        // BWT[0] is the last character of the text, as row 0 is the endmarker suffix.
        let mut rows: Vec<RawVector> = vec![RawVector::with_len(size, false); alphabet.len()];
        if let Some(&last) = text.last() {
            rows[symbol_ranks[last as usize]].set_bit(0, true);
        }
        for (i, &pos) in sa.iter().enumerate() {
            let pos = pos as usize;
            if pos > 0 {
                let c = text[pos - 1];
                rows[symbol_ranks[c as usize]].set_bit(i + 1, true);
            }
        }
        let bwt: Vec<BitVector> = rows.into_iter().map(|raw| {
            let mut bv = BitVector::from(raw);
            bv.enable_rank();
            bv
        }).collect();

        Ok(Csa { size, alphabet, symbol_ranks, counts, bwt })
    }

    /// Builds the co-lexicographic index for the given text.
    ///
    /// This is the index for the reverse text.
    pub fn new_reverse(text: &[u8]) -> Result<Self, String> {
        let reversed: Vec<u8> = text.iter().rev().copied().collect();
        Self::new(&reversed)
    }

    /// Returns the number of rows, which is the text length plus one.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the distinct symbols of the text in sorted order.
    #[inline]
    pub fn alphabet(&self) -> &[u8] {
        &self.alphabet
    }

    /// Returns the range of all rows.
    #[inline]
    pub fn full_range(&self) -> LexRange {
        LexRange::new(0, self.size)
    }

    /// Returns the number of occurrences of the symbol in the text.
    pub fn symbol_count(&self, c: u8) -> usize {
        match self.symbol_ranks[c as usize] {
            NO_SYMBOL => 0,
            rank => self.bwt[rank].count_ones(),
        }
    }

    /// Returns the range for `c` followed by the pattern of `range`.
    ///
    /// The result is empty if the range is empty or there are no such occurrences.
    pub fn backward_search(&self, range: LexRange, c: u8) -> LexRange {
        let rank = self.symbol_ranks[c as usize];
        if rank == NO_SYMBOL || range.is_empty() {
            return LexRange::default();
        }
        let bwt = &self.bwt[rank];
        LexRange::new(self.counts[rank] + bwt.rank(range.start), self.counts[rank] + bwt.rank(range.end))
    }

    /// Prepends the pattern to the pattern of `range`.
    pub fn backward_search_str(&self, mut range: LexRange, pattern: &[u8]) -> LexRange {
        for &c in pattern.iter().rev() {
            range = self.backward_search(range, c);
            if range.is_empty() {
                break;
            }
        }
        range
    }

    /// Prepends the pattern followed by a separator to the pattern of `range`.
    pub fn backward_search_h(&self, range: LexRange, pattern: &[u8], separator: u8) -> LexRange {
        let range = self.backward_search(range, separator);
        self.backward_search_str(range, pattern)
    }

    /// Returns the range of the pattern.
    pub fn find(&self, pattern: &[u8]) -> LexRange {
        self.backward_search_str(self.full_range(), pattern)
    }

    /// Appends the pattern to the pattern of a co-lexicographic range in the reverse index.
    pub fn forward_search_str(&self, mut co_range: LexRange, pattern: &[u8]) -> LexRange {
        for &c in pattern.iter() {
            co_range = self.backward_search(co_range, c);
            if co_range.is_empty() {
                break;
            }
        }
        co_range
    }

    /// Appends the pattern followed by a separator to the pattern of a co-lexicographic range in the reverse index.
    pub fn forward_search_h(&self, co_range: LexRange, pattern: &[u8], separator: u8) -> LexRange {
        let co_range = self.forward_search_str(co_range, pattern);
        self.backward_search(co_range, separator)
    }

    /// Returns the symbols preceding the rows in the range, with the ranges they lead to.
    ///
    /// The symbols are in sorted order.
    /// In the reverse index, these are the symbols that can extend the pattern to the right.
    pub fn interval_symbols(&self, range: LexRange) -> Vec<(u8, LexRange)> {
        let mut result = Vec::new();
        if range.is_empty() {
            return result;
        }
        for (rank, bwt) in self.bwt.iter().enumerate() {
            let start = bwt.rank(range.start);
            let end = bwt.rank(range.end);
            if end > start {
                result.push((self.alphabet[rank], LexRange::new(self.counts[rank] + start, self.counts[rank] + end)));
            }
        }
        result
    }
}

//-----------------------------------------------------------------------------

impl Serialize for Csa {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        utils::write_u64(writer, self.size)?;
        utils::write_u64(writer, self.alphabet.len())?;
        for &c in self.alphabet.iter() {
            utils::write_u64(writer, c as usize)?;
        }
        for bv in self.bwt.iter() {
            bv.serialize(writer)?;
        }
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let size = utils::read_u64(reader)?;
        let sigma = utils::read_u64(reader)?;
        if sigma > 256 {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "Csa: invalid alphabet size"));
        }
        let mut alphabet: Vec<u8> = Vec::with_capacity(sigma);
        for _ in 0..sigma {
            let c = utils::read_u64(reader)?;
            if c > u8::MAX as usize {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "Csa: invalid symbol"));
            }
            alphabet.push(c as u8);
        }

        let mut symbol_ranks = vec![NO_SYMBOL; 256];
        let mut counts: Vec<usize> = Vec::with_capacity(sigma);
        let mut bwt: Vec<BitVector> = Vec::with_capacity(sigma);
        let mut total = 1;
        for (rank, &c) in alphabet.iter().enumerate() {
            if rank > 0 && alphabet[rank - 1] >= c {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "Csa: alphabet is not sorted"));
            }
            let mut bv = BitVector::load(reader)?;
            if bv.len() != size {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "Csa: BWT length mismatch"));
            }
            if !bv.supports_rank() {
                bv.enable_rank();
            }
            symbol_ranks[c as usize] = rank;
            counts.push(total);
            total += bv.count_ones();
            bwt.push(bv);
        }
        if total != size {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "Csa: symbol counts do not match the size"));
        }

        Ok(Csa { size, alphabet, symbol_ranks, counts, bwt })
    }

    fn size_in_elements(&self) -> usize {
        2 + self.alphabet.len() + self.bwt.iter().map(|x| x.size_in_elements()).sum::<usize>()
    }
}

//-----------------------------------------------------------------------------

/// The lexicographic range of a pattern in the forward index and its co-lexicographic range in the reverse index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangePair {
    /// Lexicographic range in the forward index.
    pub range: LexRange,
    /// Co-lexicographic range in the reverse index.
    pub co_range: LexRange,
}

impl RangePair {
    /// Returns the ranges of the empty pattern.
    pub fn new(csa: &Csa, reverse_csa: &Csa) -> Self {
        RangePair { range: csa.full_range(), co_range: reverse_csa.full_range() }
    }

    /// Returns the ranges of the pattern.
    pub fn find(csa: &Csa, reverse_csa: &Csa, pattern: &[u8]) -> Self {
        RangePair {
            range: csa.find(pattern),
            co_range: reverse_csa.forward_search_str(reverse_csa.full_range(), pattern),
        }
    }

    /// Returns the number of occurrences.
    #[inline]
    pub fn len(&self) -> usize {
        self.range.len()
    }

    /// Returns `true` if the pattern does not occur in the text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// Returns `true` if the pattern occurs exactly once.
    #[inline]
    pub fn is_singleton(&self) -> bool {
        self.range.is_singleton() && self.co_range.is_singleton()
    }

    /// Returns `true` if the pattern of this pair extends the pattern of `other`.
    ///
    /// This only compares the lexicographic ranges.
    #[inline]
    pub fn has_prefix(&self, other: &RangePair) -> bool {
        self.range.has_prefix(&other.range)
    }
}

//-----------------------------------------------------------------------------
