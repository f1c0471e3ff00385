//! Per-chunk computations for building the path index support structures.
//!
//! The support structures are built in two passes over the block graph.
//! Each pass processes a contiguous range of blocks (a chunk) at a time and writes the results into a private buffer.
//!
//! * [`bedinx_positions_for_range`] finds the positions for the ℬ, ℰ, D, I, N, X, and U structures.
//! * [`alr_values_for_range`] finds the values for the A, Ã, L, and R integer vectors.
//!   It needs the rank support for D, which is only available after the first pass.
//!
//! Integrity violations are reported through a [`ConstructionDelegate`].

use crate::block_graph::{Block, BlockGraph, SEPARATOR};
use crate::csa::{Csa, RangePair};

use simple_sds::ops::{BitVec, Rank};
use simple_sds::sparse_vector::SparseVector;


//-----------------------------------------------------------------------------

/// Rows of the U matrix are padded to a multiple of this many bits.
pub const U_BV_BLOCK_SIZE: usize = 63;

/// Returns the length of a U matrix row for the given number of input sequences.
#[inline]
pub fn u_row_size(input_count: usize) -> usize {
    ((input_count + U_BV_BLOCK_SIZE - 1) / U_BV_BLOCK_SIZE) * U_BV_BLOCK_SIZE
}

//-----------------------------------------------------------------------------

/// Receives integrity violations and progress notifications from index construction.
///
/// Any integrity violation makes the construction fail.
/// The delegate decides how the violation is reported to the user.
/// All methods have empty default implementations.
pub trait ConstructionDelegate: Sync {
    /// A node label of the given block was not found in the suffix index.
    fn zero_occurrences(&self, _block: usize, _segment: usize, _label: &[u8]) {}

    /// A string derived from the graph occurs an unexpected number of times in the suffix index.
    fn unexpected_occurrences(&self, _block: usize, _segment: usize, _label: &[u8], _expected: usize, _actual: usize) {}

    /// Two nodes or edges were assigned the same position in the named structure.
    fn position_already_set(&self, _structure: &str, _pos: usize) {}

    /// The first pass over the blocks starts.
    fn reading_bit_vector_values(&self) {}

    /// The first pass is complete and the bitvectors are being built.
    fn processing_bit_vector_values(&self) {}

    /// The second pass over the edges starts.
    fn filling_integer_vectors(&self) {}
}

/// A [`ConstructionDelegate`] that prints integrity violations to stderr.
///
/// Progress notifications are printed if `progress` is set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoggingDelegate {
    /// Print progress notifications.
    pub progress: bool,
}

impl LoggingDelegate {
    /// Creates a new delegate.
    pub fn new(progress: bool) -> Self {
        LoggingDelegate { progress }
    }
}

impl ConstructionDelegate for LoggingDelegate {
    fn zero_occurrences(&self, block: usize, segment: usize, label: &[u8]) {
        eprintln!("Error: got zero occurrences for segment {} (block {}): {}", segment, block, String::from_utf8_lossy(label));
    }

    fn unexpected_occurrences(&self, block: usize, segment: usize, label: &[u8], expected: usize, actual: usize) {
        eprintln!(
            "Error: got {} occurrences while {} were expected for segment {} (block {}): {}",
            actual, expected, segment, block, String::from_utf8_lossy(label)
        );
    }

    fn position_already_set(&self, structure: &str, pos: usize) {
        eprintln!("Error: position {} in {} already set", pos, structure);
    }

    fn reading_bit_vector_values(&self) {
        if self.progress {
            eprintln!("Reading bit vector values");
        }
    }

    fn processing_bit_vector_values(&self) {
        if self.progress {
            eprintln!("Processing bit vector values");
        }
    }

    fn filling_integer_vectors(&self) {
        if self.progress {
            eprintln!("Filling integer vectors");
        }
    }
}

//-----------------------------------------------------------------------------

/// Results of the first pass for a chunk of blocks.
///
/// Positions in `b_positions`, `e_positions`, `shortest_prefix_lengths`, and `block_numbers` refer to prefix classes.
/// A prefix class is a maximal run of consecutive segments in a block that extend the first segment of the run.
/// All positions are global.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BedinxBuffer {
    /// Left bound of the lexicographic range of each prefix class.
    pub b_positions: Vec<usize>,
    /// Right bound of the lexicographic range of each prefix class.
    pub e_positions: Vec<usize>,
    /// Lexicographic rank of `label(lhs) label(rhs)` for each edge.
    pub d_positions: Vec<usize>,
    /// Left bound of the co-lexicographic range of each segment.
    pub i_positions: Vec<usize>,
    /// Label length of the first segment of each prefix class.
    pub shortest_prefix_lengths: Vec<usize>,
    /// Block number of each prefix class.
    pub block_numbers: Vec<usize>,
    /// Set bits in the U matrix.
    pub u_positions: Vec<usize>,
}

impl BedinxBuffer {
    /// Clears the buffer without releasing the memory.
    pub fn clear(&mut self) {
        self.b_positions.clear();
        self.e_positions.clear();
        self.d_positions.clear();
        self.i_positions.clear();
        self.shortest_prefix_lengths.clear();
        self.block_numbers.clear();
        self.u_positions.clear();
    }

    fn push_class(&mut self, label_len: usize, pair: &RangePair, block: usize) {
        self.b_positions.push(pair.range.lb());
        self.e_positions.push(pair.range.rb());
        self.i_positions.push(pair.co_range.lb());
        self.shortest_prefix_lengths.push(label_len);
        self.block_numbers.push(block);
    }

    fn push_u(&mut self, block: &Block, u_row_size: usize) {
        for (rank, inputs) in block.inputs.iter().enumerate() {
            let row_start = (block.node_csum + rank) * u_row_size;
            self.u_positions.extend(inputs.iter().map(|input| row_start + input));
        }
    }
}

// Finds the ranges for a segment and reports an error if the segment does not occur.
fn find_segment(
    csa: &Csa, reverse_csa: &Csa,
    block: usize, segment: usize, label: &[u8],
    delegate: &dyn ConstructionDelegate
) -> Result<RangePair, String> {
    let pair = RangePair::find(csa, reverse_csa, label);
    if pair.is_empty() || pair.co_range.is_empty() {
        delegate.zero_occurrences(block, segment, label);
        return Err(format!("Segment {} of block {} does not occur in the index", segment, block));
    }
    Ok(pair)
}

/// Computes the first pass positions for blocks `block_idx..block_end`.
///
/// The buffer is cleared first.
/// The first block has no in-edges, so its prefix classes are determined over all segments.
/// For later blocks, the segments are processed in the order of the in-edges.
///
/// # Errors
///
/// Returns an error after reporting it to the delegate if a segment or an edge string cannot be found.
pub fn bedinx_positions_for_range(
    csa: &Csa, reverse_csa: &Csa,
    graph: &BlockGraph, u_row_size: usize,
    mut block_idx: usize, block_end: usize,
    buffer: &mut BedinxBuffer,
    delegate: &dyn ConstructionDelegate
) -> Result<(), String> {
    buffer.clear();
    assert!(block_end < graph.blocks.len(), "Block range {}..{} includes the sentinel", block_idx, block_end);

    if block_idx == 0 && block_idx < block_end {
        let block = &graph.blocks[0];
        // Segments are sorted, so a prefix is always followed by its extensions.
        let mut prefix: Option<RangePair> = None;
        for (rank, segment) in block.segments.iter().enumerate() {
            let pair = find_segment(csa, reverse_csa, 0, rank, segment, delegate)?;
            match prefix {
                Some(prefix_pair) if pair.has_prefix(&prefix_pair) => {
                    buffer.i_positions.push(pair.co_range.lb());
                },
                _ => {
                    buffer.push_class(segment.len(), &pair, 0);
                    prefix = Some(pair);
                },
            }
        }
        buffer.push_u(block, u_row_size);
        block_idx += 1;
    }

    for block_idx in block_idx..block_end {
        let prev_block = &graph.blocks[block_idx - 1];
        let block = &graph.blocks[block_idx];

        let mut prev_rhs: Option<usize> = None;
        let mut prefix: Option<RangePair> = None;
        let mut rhs_pair = RangePair::default();
        for &(rhs, lhs) in block.reverse_in_edges.iter() {
            if prev_rhs != Some(rhs) {
                prev_rhs = Some(rhs);
                let rhs_label = &block.segments[rhs];
                rhs_pair = find_segment(csa, reverse_csa, block_idx, rhs, rhs_label, delegate)?;
                match prefix {
                    Some(prefix_pair) if rhs_pair.has_prefix(&prefix_pair) => {
                        buffer.i_positions.push(rhs_pair.co_range.lb());
                    },
                    _ => {
                        buffer.push_class(rhs_label.len(), &rhs_pair, block_idx);
                        prefix = Some(rhs_pair);
                    },
                }
            }

            // The rank of label(lhs) label(rhs) # is the left bound of the range of label(lhs) label(rhs),
            // as the separator is smaller than any other symbol except the endmarker.
            let lhs_label = &prev_block.segments[lhs];
            let edge_range = csa.backward_search_str(rhs_pair.range, lhs_label);
            if edge_range.is_empty() {
                let mut label = lhs_label.clone();
                label.extend_from_slice(&block.segments[rhs]);
                delegate.unexpected_occurrences(block_idx, rhs, &label, 1, 0);
                return Err(format!("Edge ({}, {}) into block {} does not occur in the index", lhs, rhs, block_idx));
            }
            buffer.d_positions.push(edge_range.lb());
        }

        buffer.push_u(block, u_row_size);
    }

    Ok(())
}

//-----------------------------------------------------------------------------

/// Values for the A, Ã, L, and R integer vectors for an edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AlrValues {
    /// Index of the edge in A and R: rank of the D position of the edge.
    pub alpha: usize,
    /// Index of the edge in Ã and L: co-lexicographic rank of `# label(lhs) label(rhs) #`.
    pub alpha_tilde: usize,
    /// Rank of the left node in its block.
    pub a: usize,
    /// Rank of the right node in its block.
    pub a_tilde: usize,
    /// `rhs + lhs_height - lhs`, where `lhs_height` is the height of the block of the left node.
    pub lr: usize,
}

/// Results of the second pass for a chunk of blocks.
pub type AlrBuffer = Vec<AlrValues>;

/// Computes the second pass values for the in-edges of blocks `block_idx..block_end`.
///
/// The buffer is cleared first.
/// The first block must not be included, as it has no in-edges.
///
/// # Errors
///
/// Returns an error after reporting it to the delegate if an edge string does not occur exactly once or its D position is missing.
pub fn alr_values_for_range(
    csa: &Csa, reverse_csa: &Csa,
    graph: &BlockGraph, d: &SparseVector,
    block_idx: usize, block_end: usize,
    buffer: &mut AlrBuffer,
    delegate: &dyn ConstructionDelegate
) -> Result<(), String> {
    buffer.clear();
    assert!(block_idx > 0, "The first block has no in-edges");

    for block_idx in block_idx..block_end {
        let lhs_block = &graph.blocks[block_idx - 1];
        let rhs_block = &graph.blocks[block_idx];
        let lhs_height = lhs_block.height();

        for &(rhs, lhs) in rhs_block.reverse_in_edges.iter() {
            let lhs_label = &lhs_block.segments[lhs];
            let rhs_label = &rhs_block.segments[rhs];

            let range = csa.backward_search_h(csa.full_range(), rhs_label, SEPARATOR);
            let range = csa.backward_search_str(range, lhs_label);
            let co_range = reverse_csa.backward_search(reverse_csa.full_range(), SEPARATOR);
            let co_range = reverse_csa.forward_search_str(co_range, lhs_label);
            let co_range = reverse_csa.forward_search_h(co_range, rhs_label, SEPARATOR);

            if range.is_empty() || !co_range.is_singleton() || !d.get(range.lb()) {
                let mut label = lhs_label.clone();
                label.extend_from_slice(rhs_label);
                delegate.unexpected_occurrences(block_idx, rhs, &label, 1, co_range.len());
                return Err(format!("Edge ({}, {}) into block {} cannot be located in the index", lhs, rhs, block_idx));
            }

            buffer.push(AlrValues {
                alpha: d.rank(range.lb()),
                alpha_tilde: co_range.lb(),
                a: lhs,
                a_tilde: rhs,
                lr: rhs + lhs_height - lhs,
            });
        }
    }

    Ok(())
}

//-----------------------------------------------------------------------------
