//! The path index: a suffix index over the indexable text of a founder graph with support structures for listing the inputs that contain a pattern.
//!
//! The support structures are:
//!
//! * `B`: left bounds of the lexicographic ranges of prefix classes.
//! * `E`: right bounds of the same ranges in `B` order.
//! * `N`: block numbers of the prefix classes in `B` order.
//! * `X`: shortest prefix lengths of the classes in unary.
//! * `D`: lexicographic ranks of the edge strings `label(v) label(w) #`.
//! * `I`: lexicographic positions of node labels.
//! * `bh`: block heights in unary.
//! * `m`: aligned positions of the blocks.
//! * `A` / `R`: left node rank and rank difference for each edge, indexed by the `D` rank.
//! * `Ã` / `L`: right node rank and rank difference for each edge, indexed by the co-lexicographic rank of `# label(v) label(w) #`.
//! * `U`: a bit matrix with one row of input sequences for each node.
//!
//! A query searches the pattern backwards in the forward index.
//! Each time the range of the current suffix nests inside the range of a prefix class, the match has crossed a block boundary.
//! The rows of `U` for the nodes on the crossed edges are intersected to determine the inputs that contain the match.
//! The parts of the pattern before the first and after the last crossing are resolved with the reverse index and the edge tables.

use crate::block_graph::{self, BlockGraph, NullTextDelegate, SEPARATOR};
use crate::builder::{self, BuildParameters};
use crate::construction::ConstructionDelegate;
use crate::csa::{Csa, LexRange};
use crate::utils;

use simple_sds::bit_vector::BitVector;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::{Access, BitVec, Rank, Select, SelectZero, Vector};
use simple_sds::raw_vector::{AccessRaw, RawVector};
use simple_sds::serialize::Serialize;
use simple_sds::sparse_vector::SparseVector;

use std::io;


//-----------------------------------------------------------------------------

/// Support structures for path queries.
///
/// See the module documentation for the structures.
/// Built with [`builder::build_supporting_data_structures`].
#[derive(Clone, Debug)]
pub struct PathIndexSupport {
    pub(crate) b: SparseVector,
    pub(crate) e: IntVector,
    pub(crate) d: SparseVector,
    pub(crate) i: SparseVector,
    pub(crate) x: BitVector,
    pub(crate) bh: BitVector,
    pub(crate) m: SparseVector,
    pub(crate) n: IntVector,
    pub(crate) a: IntVector,
    pub(crate) a_tilde: IntVector,
    pub(crate) l: IntVector,
    pub(crate) r: IntVector,
    pub(crate) u: RawVector,
    pub(crate) input_count: usize,
    pub(crate) u_row_size: usize,
}

impl PathIndexSupport {
    /// Enables the rank / select structures the queries need.
    pub fn update_support(&mut self) {
        for bv in [&mut self.x, &mut self.bh] {
            if !bv.supports_rank() {
                bv.enable_rank();
            }
            if !bv.supports_select_zero() {
                bv.enable_select_zero();
            }
        }
    }

    /// Returns the number of blocks.
    pub fn block_count(&self) -> usize {
        self.m.count_ones()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        // One leading zero, a zero for each block, and a zero for the sentinel block.
        self.bh.len().saturating_sub(2 + self.block_count())
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.a.len()
    }

    /// Returns the number of prefix classes.
    pub fn class_count(&self) -> usize {
        self.b.count_ones()
    }

    /// Returns the number of nodes in the blocks before `block`.
    pub fn nodes_before(&self, block: usize) -> usize {
        match self.bh.select_zero(block) {
            Some(pos) => self.bh.rank(pos),
            None => self.node_count(),
        }
    }

    /// Returns the number of nodes in the block.
    pub fn block_height(&self, block: usize) -> usize {
        self.nodes_before(block + 1) - self.nodes_before(block)
    }

    /// Returns the shortest prefix length of the prefix class.
    pub fn prefix_len(&self, class: usize) -> usize {
        match (self.x.select_zero(class), self.x.select_zero(class + 1)) {
            (Some(start), Some(end)) => end - start - 1,
            _ => 0,
        }
    }

    /// Returns the aligned position of the first column of the block.
    pub fn aligned_position(&self, block: usize) -> usize {
        self.m.select(block).unwrap_or(0)
    }

    /// Returns `true` if the input contains the node.
    pub fn contains(&self, node: usize, input: usize) -> bool {
        input < self.input_count && self.u.bit(node * self.u_row_size + input)
    }

    // Returns the prefix class and its lexicographic range, if the range is contained in the class range.
    fn expand(&self, range: LexRange) -> Option<(usize, LexRange)> {
        let class = self.b.rank(range.lb() + 1).checked_sub(1)?;
        let start = self.b.select(class)?;
        let end = self.e.get(class) as usize + 1;
        let class_range = LexRange::new(start, end);
        if range.has_prefix(&class_range) { Some((class, class_range)) } else { None }
    }

    // Returns the edge key for lexicographic position `pos` if the position is an edge string.
    fn edge_key(&self, pos: usize) -> Option<usize> {
        if pos < self.d.len() && self.d.get(pos) { Some(self.d.rank(pos)) } else { None }
    }

    fn row(&self, node: usize) -> RowReader<'_> {
        RowReader::new(&self.u, node * self.u_row_size, self.input_count)
    }
}

//-----------------------------------------------------------------------------

/// Sequential reader for a bit range of a [`RawVector`] in 64-bit windows.
///
/// The last window contains the residual bits in the low-order positions.
pub struct RowReader<'a> {
    data: &'a RawVector,
    pos: usize,
    remaining: usize,
}

impl<'a> RowReader<'a> {
    /// Creates a reader for bits `offset..offset + len`.
    ///
    /// # Panics
    ///
    /// Panics if the range is not within the vector.
    pub fn new(data: &'a RawVector, offset: usize, len: usize) -> Self {
        assert!(offset + len <= data.len(), "RowReader: range {}..{} exceeds the length {}", offset, offset + len, data.len());
        RowReader { data, pos: offset, remaining: len }
    }
}

impl<'a> Iterator for RowReader<'a> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let width = self.remaining.min(64);
        let word = self.pos / 64;
        let offset = self.pos % 64;
        let mut value = self.data.word(word) >> offset;
        if offset > 0 && offset + width > 64 {
            value |= self.data.word(word + 1) << (64 - offset);
        }
        if width < 64 {
            value &= (1u64 << width) - 1;
        }
        self.pos += width;
        self.remaining -= width;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let words = self.remaining.div_ceil(64);
        (words, Some(words))
    }
}

impl<'a> ExactSizeIterator for RowReader<'a> {}

//-----------------------------------------------------------------------------

impl Serialize for PathIndexSupport {
    fn serialize_header<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        utils::write_u64(writer, self.input_count)?;
        utils::write_u64(writer, self.u_row_size)
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.b.serialize(writer)?;
        self.e.serialize(writer)?;
        self.d.serialize(writer)?;
        self.i.serialize(writer)?;
        self.x.serialize(writer)?;
        self.bh.serialize(writer)?;
        self.m.serialize(writer)?;
        self.n.serialize(writer)?;
        self.a.serialize(writer)?;
        self.a_tilde.serialize(writer)?;
        self.l.serialize(writer)?;
        self.r.serialize(writer)?;
        self.u.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let input_count = utils::read_u64(reader)?;
        let u_row_size = utils::read_u64(reader)?;
        let mut result = PathIndexSupport {
            b: SparseVector::load(reader)?,
            e: IntVector::load(reader)?,
            d: SparseVector::load(reader)?,
            i: SparseVector::load(reader)?,
            x: BitVector::load(reader)?,
            bh: BitVector::load(reader)?,
            m: SparseVector::load(reader)?,
            n: IntVector::load(reader)?,
            a: IntVector::load(reader)?,
            a_tilde: IntVector::load(reader)?,
            l: IntVector::load(reader)?,
            r: IntVector::load(reader)?,
            u: RawVector::load(reader)?,
            input_count,
            u_row_size,
        };
        if result.e.len() != result.b.count_ones() || result.n.len() != result.b.count_ones() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "PathIndexSupport: E / N length does not match B"));
        }
        if result.a.len() != result.r.len() || result.a_tilde.len() != result.l.len() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "PathIndexSupport: edge table length mismatch"));
        }
        if input_count > u_row_size || result.u.len() != result.node_count() * u_row_size {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "PathIndexSupport: invalid U dimensions"));
        }
        result.update_support();
        Ok(result)
    }

    fn size_in_elements(&self) -> usize {
        2 + self.b.size_in_elements() + self.e.size_in_elements()
            + self.d.size_in_elements() + self.i.size_in_elements()
            + self.x.size_in_elements() + self.bh.size_in_elements()
            + self.m.size_in_elements() + self.n.size_in_elements()
            + self.a.size_in_elements() + self.a_tilde.size_in_elements()
            + self.l.size_in_elements() + self.r.size_in_elements()
            + self.u.size_in_elements()
    }
}

//-----------------------------------------------------------------------------

/// The result of a path query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryResult {
    /// Number of matches.
    ///
    /// If the match did not cross a block boundary, this is the number of occurrences in the indexable text.
    /// Otherwise this is the number of input sequences containing the match.
    pub count: usize,
    /// The match crossed at least one block boundary.
    pub did_expand: bool,
    /// Aligned position of the leftmost block the match reaches, if the match crossed a boundary.
    pub block_aln_pos: usize,
    /// Number of pattern characters before the start of that block.
    pub offset: usize,
    /// Input sequences containing the match in increasing order, if the match crossed a boundary.
    pub occurrences: Vec<usize>,
}

impl QueryResult {
    /// Header line of the TSV report written by [`QueryResult::write_report_row`].
    pub const REPORT_HEADER: &'static str = "PATTERN\tMATCH_COUNT\tDID_EXPAND\tWALL_TIME\tBLOCK_ALN_POS\tMATCH_OFFSET\tMATCHES";

    /// Writes a TSV report row for the result, with the query time in microseconds.
    ///
    /// The last three columns are `0`, `0`, and an empty list if the match did not cross a block boundary.
    pub fn write_report_row<W: io::Write>(&self, output: &mut W, pattern: &str, micros: f64) -> io::Result<()> {
        write!(output, "{}\t{}\t{}\t{:.3}\t", pattern, self.count, self.did_expand as usize, micros)?;
        if self.did_expand {
            let matches: Vec<String> = self.occurrences.iter().map(|x| x.to_string()).collect();
            writeln!(output, "{}\t{}\t{}", self.block_aln_pos, self.offset, matches.join(","))
        } else {
            writeln!(output, "0\t0\t")
        }
    }

    fn miss() -> Self {
        Self::default()
    }

    fn text_matches(count: usize) -> Self {
        QueryResult { count, ..Self::default() }
    }
}

/// Lists the set bits in the intersection of the bit vectors.
///
/// All vectors must have the same number of words.
pub fn report_matches(vectors: &[&[u64]]) -> Vec<usize> {
    let mut result = Vec::new();
    let words = vectors.first().map(|x| x.len()).unwrap_or(0);
    for word_idx in 0..words {
        let mut word = vectors.iter().fold(u64::MAX, |acc, v| acc & v[word_idx]);
        while word != 0 {
            result.push(word_idx * 64 + word.trailing_zeros() as usize);
            word &= word - 1;
        }
    }
    result
}

fn all_ones(len: usize) -> Vec<u64> {
    let mut result = vec![u64::MAX; len.div_ceil(64)];
    if len % 64 != 0 {
        if let Some(last) = result.last_mut() {
            *last = (1u64 << (len % 64)) - 1;
        }
    }
    result
}

//-----------------------------------------------------------------------------

/// A path index for a founder graph.
///
/// # Examples
///
/// ```
/// use founder_graph_index::{BlockGraph, BuildParameters, InMemoryMsaReader, LoggingDelegate, PathIndex};
///
/// let mut reader = InMemoryMsaReader::from_sequences(&["ACCT", "AGCT"]);
/// let graph = BlockGraph::read_optimized_segmentation(&mut reader, &[2, 4], false).unwrap();
/// let index = PathIndex::build(&graph, &BuildParameters::with_threads(1), &LoggingDelegate::new(false)).unwrap();
///
/// let result = index.list_occurrences(b"ACCT");
/// assert!(result.did_expand);
/// assert_eq!(result.occurrences, vec![0]);
/// assert_eq!(index.list_occurrences(b"GA").count, 0);
/// ```
#[derive(Clone, Debug)]
pub struct PathIndex {
    csa: Csa,
    reverse_csa: Csa,
    support: PathIndexSupport,
}

impl PathIndex {
    /// Builds the path index for the graph.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph has no blocks or if the construction fails.
    pub fn build(graph: &BlockGraph, params: &BuildParameters, delegate: &dyn ConstructionDelegate) -> Result<Self, String> {
        if graph.block_count() == 0 {
            return Err(String::from("Cannot build a path index for an empty graph"));
        }

        let mut text: Vec<u8> = Vec::new();
        let len = block_graph::write_indexable_text(graph, &mut text, &mut NullTextDelegate)?;
        if params.progress {
            eprintln!("Indexable text: {} bytes", len);
        }

        if params.progress {
            eprintln!("Building the forward and reverse suffix indexes");
        }
        let csa = Csa::new(&text)?;
        let reverse_csa = Csa::new_reverse(&text)?;
        drop(text);

        let support = builder::build_supporting_data_structures(graph, &csa, &reverse_csa, params, delegate)?;
        Ok(PathIndex { csa, reverse_csa, support })
    }

    /// Returns the forward index.
    pub fn csa(&self) -> &Csa {
        &self.csa
    }

    /// Returns the reverse index.
    pub fn reverse_csa(&self) -> &Csa {
        &self.reverse_csa
    }

    /// Returns the support structures.
    pub fn support(&self) -> &PathIndexSupport {
        &self.support
    }

    /// Returns the number of input sequences.
    pub fn input_count(&self) -> usize {
        self.support.input_count
    }

    /// Returns the number of blocks.
    pub fn block_count(&self) -> usize {
        self.support.block_count()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.support.node_count()
    }

    /// Returns the number of edges.
    pub fn edge_count(&self) -> usize {
        self.support.edge_count()
    }

    /// Returns the size of the serialized index in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.size_in_elements() * 8
    }
}

//-----------------------------------------------------------------------------

// Query state after the last boundary crossing.
struct Expansion {
    // Block where the first crossing ended.
    first_block: usize,
    // Range of the pattern suffix at the first crossing.
    first_range: LexRange,
    // Shortest prefix length of the first prefix class.
    first_prefix_len: usize,
    // Block of the leftmost node reached.
    block: usize,
    // Characters consumed after the last crossing.
    len1: usize,
    // Label length of the last node crossed in the middle, if any.
    len2: usize,
    // Range of the first middle node label followed by the suffix at the first crossing.
    middle_range: Option<LexRange>,
    // The last node crossed in the middle.
    node: usize,
}

impl PathIndex {
    /// Lists the input sequences containing the pattern.
    ///
    /// If the match crosses a block boundary, the result contains the inputs with a path that spells the pattern.
    /// Otherwise only the number of occurrences in the indexable text is reported.
    /// A pattern that does not occur is a miss with count 0.
    pub fn list_occurrences(&self, pattern: &[u8]) -> QueryResult {
        if pattern.is_empty() || pattern.contains(&SEPARATOR) {
            return QueryResult::miss();
        }

        // Seek the first boundary.
        let mut range = self.csa.full_range();
        let mut remaining = pattern.len();
        let mut found: Option<(usize, LexRange)> = None;
        while remaining > 0 {
            remaining -= 1;
            range = self.csa.backward_search(range, pattern[remaining]);
            if range.is_empty() {
                return QueryResult::miss();
            }
            if self.block_count() > 1 {
                found = self.support.expand(range);
                if found.is_some() {
                    break;
                }
            }
        }
        let (class, class_range) = match found {
            Some(value) => value,
            None => return QueryResult::text_matches(range.len()),
        };

        let first_block = self.support.n.get(class) as usize;
        let mut state = Expansion {
            first_block,
            first_range: range,
            first_prefix_len: self.support.prefix_len(class),
            block: first_block,
            len1: 0,
            len2: 0,
            middle_range: None,
            node: 0,
        };

        // Cross the remaining boundaries.
        let mut occ = all_ones(self.input_count());
        range = class_range;
        while remaining > 0 {
            remaining -= 1;
            range = self.csa.backward_search(range, pattern[remaining]);
            if range.is_empty() {
                return QueryResult::miss();
            }
            state.len1 += 1;
            if state.block == 0 {
                continue;
            }
            if let Some((_, class_range)) = self.support.expand(range) {
                let key = match self.support.edge_key(range.lb()) {
                    Some(key) => key,
                    None => continue,
                };
                let lhs_rank = self.support.a.get(key) as usize;
                if lhs_rank >= self.support.block_height(state.block - 1) {
                    continue;
                }
                let node = self.support.nodes_before(state.block - 1) + lhs_rank;
                if !self.and_row(node, &mut occ) {
                    return QueryResult::miss();
                }
                if state.middle_range.is_none() {
                    // The class range forgets the part of the first suffix after the class prefix.
                    let label = &pattern[remaining..remaining + state.len1];
                    state.middle_range = Some(self.csa.backward_search_str(state.first_range, label));
                }
                state.node = node;
                state.len2 = state.len1;
                state.len1 = 0;
                state.block -= 1;
                range = class_range;
            }
        }

        let tail = self.tail_paths(&state);
        let head = self.head_paths(pattern, &state);
        let occurrences = report_matches(&[occ.as_slice(), head.as_slice(), tail.as_slice()]);
        QueryResult {
            count: occurrences.len(),
            did_expand: true,
            block_aln_pos: self.support.aligned_position(state.block),
            offset: state.len1,
            occurrences,
        }
    }

    // Paths consistent with the part of the pattern after the last boundary it reaches.
    fn tail_paths(&self, state: &Expansion) -> Vec<u64> {
        if state.first_block + 1 < self.block_count() {
            self.combine_node_paths_right(state.first_range, state.first_block)
        } else if let Some(range) = state.middle_range {
            self.combine_node_paths_right(range, state.first_block - 1)
        } else {
            all_ones(self.input_count())
        }
    }

    // Paths consistent with the part of the pattern before the first boundary it reaches.
    fn head_paths(&self, pattern: &[u8], state: &Expansion) -> Vec<u64> {
        let is_last = state.first_block + 1 >= self.block_count();
        let crossed_middle = state.middle_range.is_some();
        if state.len1 == 0 && (crossed_middle || !is_last) {
            return all_ones(self.input_count());
        }

        let mut result = vec![0u64; self.input_count().div_ceil(64)];
        let prefix = &pattern[..state.len1];
        let prefix_range = self.reverse_csa.forward_search_str(self.reverse_csa.full_range(), prefix);
        if prefix_range.is_empty() {
            return result;
        }

        if crossed_middle {
            if state.len1 > 0 && state.block > 0 {
                let label = &pattern[state.len1..state.len1 + state.len2];
                let co_range = self.reverse_csa.forward_search_h(prefix_range, label, SEPARATOR);
                self.combine_node_paths_left(co_range, state.node, state.block, &mut result);
            }
            return result;
        }

        if state.first_block == 0 {
            // Nothing can precede a node in the first block.
            return result;
        }
        let suffix = &pattern[state.len1..];
        if !is_last {
            for len in state.first_prefix_len..suffix.len() {
                let co_range = self.reverse_csa.forward_search_h(prefix_range, &suffix[..len], SEPARATOR);
                self.combine_node_paths_left_multiple(co_range, state.first_block, &mut result);
            }
        }

        // The suffix itself and its extensions up to the end of the node label.
        let mut stack = vec![self.reverse_csa.forward_search_str(prefix_range, suffix)];
        while let Some(co_range) = stack.pop() {
            for (symbol, next) in self.reverse_csa.interval_symbols(co_range) {
                if symbol == SEPARATOR {
                    self.combine_node_paths_left_multiple(next, state.first_block, &mut result);
                } else {
                    stack.push(next);
                }
            }
        }
        result
    }

    // Intersects `occ` with the row of the node. Returns `false` if the result is empty.
    fn and_row(&self, node: usize, occ: &mut [u64]) -> bool {
        let mut nonempty = false;
        for (word, row) in occ.iter_mut().zip(self.support.row(node)) {
            *word &= row;
            nonempty |= *word != 0;
        }
        nonempty
    }

    // Adds the inputs containing both nodes to `result`.
    fn or_edge(&self, lhs: usize, rhs: usize, result: &mut [u64]) {
        for ((word, left), right) in result.iter_mut().zip(self.support.row(lhs)).zip(self.support.row(rhs)) {
            *word |= left & right;
        }
    }

    /// Returns the inputs with an edge whose string is in the lexicographic range and starts with a node in the block.
    fn combine_node_paths_right(&self, range: LexRange, block: usize) -> Vec<u64> {
        let mut result = vec![0u64; self.input_count().div_ceil(64)];
        let support = &self.support;
        let first_node = support.nodes_before(block);
        let height = support.block_height(block);
        let node_count = support.node_count();
        for key in support.d.rank(range.start)..support.d.rank(range.end) {
            let lhs_rank = support.a.get(key) as usize;
            if lhs_rank >= height {
                continue;
            }
            let lhs = first_node + lhs_rank;
            let rhs = lhs + support.r.get(key) as usize;
            if rhs < node_count {
                self.or_edge(lhs, rhs, &mut result);
            }
        }
        result
    }

    /// Adds the inputs with an edge to `node` whose string is in the co-lexicographic range.
    fn combine_node_paths_left(&self, co_range: LexRange, node: usize, block: usize, result: &mut [u64]) {
        let support = &self.support;
        let first_node = support.nodes_before(block);
        let lhs_first = support.nodes_before(block - 1);
        for key in co_range.start..co_range.end.min(support.a_tilde.len()) {
            let rhs_rank = support.a_tilde.get(key) as usize;
            if first_node + rhs_rank != node {
                continue;
            }
            match node.checked_sub(support.l.get(key) as usize) {
                Some(lhs) if lhs >= lhs_first && lhs < first_node => self.or_edge(lhs, node, result),
                _ => {},
            }
        }
    }

    /// Adds the inputs with an edge to a node in the block whose string is in the co-lexicographic range.
    fn combine_node_paths_left_multiple(&self, co_range: LexRange, block: usize, result: &mut [u64]) {
        let support = &self.support;
        let first_node = support.nodes_before(block);
        let height = support.block_height(block);
        let lhs_first = support.nodes_before(block - 1);
        for key in co_range.start..co_range.end.min(support.a_tilde.len()) {
            let rhs_rank = support.a_tilde.get(key) as usize;
            if rhs_rank >= height {
                continue;
            }
            let rhs = first_node + rhs_rank;
            match rhs.checked_sub(support.l.get(key) as usize) {
                Some(lhs) if lhs >= lhs_first && lhs < first_node => self.or_edge(lhs, rhs, result),
                _ => {},
            }
        }
    }
}

//-----------------------------------------------------------------------------

impl Serialize for PathIndex {
    fn serialize_header<T: io::Write>(&self, _: &mut T) -> io::Result<()> {
        Ok(())
    }

    fn serialize_body<T: io::Write>(&self, writer: &mut T) -> io::Result<()> {
        self.csa.serialize(writer)?;
        self.reverse_csa.serialize(writer)?;
        self.support.serialize(writer)?;
        Ok(())
    }

    fn load<T: io::Read>(reader: &mut T) -> io::Result<Self> {
        let csa = Csa::load(reader)?;
        let reverse_csa = Csa::load(reader)?;
        if csa.size() != reverse_csa.size() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "PathIndex: forward and reverse index sizes differ"));
        }
        let support = PathIndexSupport::load(reader)?;
        if support.b.len() != csa.size() || support.d.len() != csa.size() {
            return Err(io::Error::new(io::ErrorKind::InvalidData, "PathIndex: support structures do not match the index"));
        }
        Ok(PathIndex { csa, reverse_csa, support })
    }

    fn size_in_elements(&self) -> usize {
        self.csa.size_in_elements() + self.reverse_csa.size_in_elements() + self.support.size_in_elements()
    }
}

//-----------------------------------------------------------------------------
