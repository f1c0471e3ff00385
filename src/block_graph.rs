//! Founder graphs as sequences of blocks.
//!
//! A [`BlockGraph`] is built from a multiple sequence alignment and a segmentation of its columns into blocks.
//! Each block contains the distinct gap-stripped segments of the aligned sequences in the column range.
//! The segments are the node labels of the founder graph, and the edges connect the segments of consecutive blocks that are adjacent in some input sequence.
//!
//! The graph also defines the indexable text used for building the suffix indexes.
//! See [`write_indexable_text`].

use crate::msa::MsaReader;
use crate::utils;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

#[cfg(test)]
mod tests;

//-----------------------------------------------------------------------------

/// Separator character in the indexable text.
///
/// The separator must be lexicographically smaller than any character in the segments.
pub const SEPARATOR: u8 = b'#';

/// A block of the founder graph.
///
/// Segments are numbered by their rank within the block.
/// Global node identifiers are `node_csum + rank`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Block {
    /// Distinct segments in lexicographic order.
    pub segments: Vec<Vec<u8>>,
    /// For each segment, the input sequences that contain it, in increasing order.
    pub inputs: Vec<Vec<usize>>,
    /// In-edges as (rank in this block, rank in the previous block) in sorted order.
    pub reverse_in_edges: BTreeSet<(usize, usize)>,
    /// Zero-based aligned position of the first column in the block.
    pub aligned_position: usize,
    /// Number of nodes in the preceding blocks.
    pub node_csum: usize,
    /// Total length of node labels in the preceding blocks.
    pub node_label_length_csum: usize,
}

impl Block {
    /// Returns the number of segments (the height of the block).
    #[inline]
    pub fn height(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the block has no segments.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

//-----------------------------------------------------------------------------

/// A founder graph stored as a sequence of blocks.
///
/// The last block is a sentinel without segments or edges.
/// Its positional fields contain the totals over the real blocks.
///
/// # Examples
///
/// ```
/// use founder_graph_index::{BlockGraph, InMemoryMsaReader};
///
/// let mut reader = InMemoryMsaReader::from_sequences(&[b"ACCT", b"AGCT"]);
/// let graph = BlockGraph::read_optimized_segmentation(&mut reader, &[2, 4], false).unwrap();
/// assert_eq!(graph.block_count(), 2);
/// assert_eq!(graph.node_count, 3);
/// assert_eq!(graph.edge_count, 2);
/// assert_eq!(graph.blocks[0].segments, vec![b"AC".to_vec(), b"AG".to_vec()]);
/// assert_eq!(graph.blocks[1].segments, vec![b"CT".to_vec()]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockGraph {
    /// The blocks, followed by a sentinel.
    pub blocks: Vec<Block>,
    /// Number of nodes.
    pub node_count: usize,
    /// Number of edges.
    pub edge_count: usize,
    /// Total length of node labels.
    pub node_label_length_sum: usize,
    /// Length of the longest node label.
    pub node_label_max_length: usize,
    /// Number of columns in the alignment.
    pub aligned_size: usize,
    /// Number of input sequences.
    pub input_count: usize,
    /// Maximum number of segments in a block.
    pub max_block_height: usize,
}

impl BlockGraph {
    /// Builds a block graph from the sequences in the reader and the block right bounds.
    ///
    /// The files must already have been added to the reader.
    /// The last bound must be equal to the aligned size.
    ///
    /// # Errors
    ///
    /// Returns an error if the bounds do not cover the alignment, if a segment is empty, or if a segment contains a character not greater than [`SEPARATOR`].
    pub fn read_optimized_segmentation<R: MsaReader>(reader: &mut R, bounds: &[usize], progress: bool) -> Result<Self, String> {
        reader.prepare()?;
        let input_count = reader.handle_count();
        let aligned_size = reader.aligned_size();
        if input_count == 0 {
            return Err(String::from("No aligned sequences"));
        }
        if bounds.last().copied().unwrap_or(0) != aligned_size {
            return Err(format!("Block bounds do not cover the alignment of length {}", aligned_size));
        }

        let mut graph = BlockGraph {
            blocks: Vec::with_capacity(bounds.len() + 1),
            aligned_size,
            input_count,
            ..Self::default()
        };

        // Node ranks for each input in the previous and the current block.
        let mut lhs_nodes: Vec<usize> = Vec::new();
        let mut lb = 0;
        for (block_idx, &rb) in bounds.iter().enumerate() {
            if rb <= lb {
                return Err(format!("Block bound {} does not exceed the previous bound {}", rb, lb));
            }
            if progress && block_idx > 0 && block_idx % 100_000 == 0 {
                eprintln!("Block {} / {}", block_idx, bounds.len());
            }
            let (mut block, rhs_nodes) = read_block(reader, lb, rb)?;
            if block_idx > 0 {
                for (&lhs, &rhs) in lhs_nodes.iter().zip(rhs_nodes.iter()) {
                    block.reverse_in_edges.insert((rhs, lhs));
                }
            }
            graph.append(block, lb);
            lhs_nodes = rhs_nodes;
            lb = rb;
        }

        graph.blocks.push(Block {
            aligned_position: graph.aligned_size,
            node_csum: graph.node_count,
            node_label_length_csum: graph.node_label_length_sum,
            ..Block::default()
        });

        if progress {
            eprintln!(
                "Block graph: {} blocks, {} nodes, {} edges, {} inputs",
                graph.block_count(), graph.node_count, graph.edge_count, graph.input_count
            );
        }
        Ok(graph)
    }

    // Appends a block and updates the statistics.
    fn append(&mut self, mut block: Block, aligned_position: usize) {
        block.aligned_position = aligned_position;
        block.node_csum = self.node_count;
        block.node_label_length_csum = self.node_label_length_sum;

        self.node_count += block.height();
        self.edge_count += block.reverse_in_edges.len();
        self.max_block_height = self.max_block_height.max(block.height());
        for segment in block.segments.iter() {
            self.node_label_length_sum += segment.len();
            self.node_label_max_length = self.node_label_max_length.max(segment.len());
        }
        self.blocks.push(block);
    }

    /// Returns the number of blocks, excluding the sentinel.
    #[inline]
    pub fn block_count(&self) -> usize {
        self.blocks.len().saturating_sub(1)
    }

    /// Returns the number of segments in the first block.
    #[inline]
    pub fn first_block_segment_count(&self) -> usize {
        self.blocks.first().map(|x| x.height()).unwrap_or(0)
    }

    /// Returns the label of the node with the given global identifier.
    pub fn node_label(&self, node: usize) -> Option<&[u8]> {
        if node >= self.node_count {
            return None;
        }
        let block_idx = self.blocks.partition_point(|block| block.node_csum <= node) - 1;
        let block = &self.blocks[block_idx];
        Some(&block.segments[node - block.node_csum])
    }

    /// Checks the structural invariants of the graph.
    ///
    /// Segments must be nonempty, distinct, and sorted within each block.
    /// Edges must refer to existing segments.
    /// Cumulative sums must match the segments.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.blocks.is_empty() {
            return Err(String::from("Missing sentinel block"));
        }
        let mut node_csum = 0;
        let mut length_csum = 0;
        let mut edge_count = 0;
        for (block_idx, block) in self.blocks.iter().enumerate() {
            if block.node_csum != node_csum || block.node_label_length_csum != length_csum {
                return Err(format!("Block {}: wrong cumulative sums", block_idx));
            }
            for (i, segment) in block.segments.iter().enumerate() {
                if segment.is_empty() {
                    return Err(format!("Block {}: segment {} is empty", block_idx, i));
                }
                if i > 0 && block.segments[i - 1] >= *segment {
                    return Err(format!("Block {}: segments {} and {} are not in sorted order", block_idx, i - 1, i));
                }
            }
            if block.inputs.len() != block.height() {
                return Err(format!("Block {}: input lists do not match the segments", block_idx));
            }
            let prev_height = if block_idx > 0 { self.blocks[block_idx - 1].height() } else { 0 };
            for &(rhs, lhs) in block.reverse_in_edges.iter() {
                if rhs >= block.height() || lhs >= prev_height {
                    return Err(format!("Block {}: invalid edge ({}, {})", block_idx, lhs, rhs));
                }
            }
            node_csum += block.height();
            length_csum += block.segments.iter().map(|x| x.len()).sum::<usize>();
            edge_count += block.reverse_in_edges.len();
        }
        if node_csum != self.node_count || length_csum != self.node_label_length_sum || edge_count != self.edge_count {
            return Err(String::from("Graph statistics do not match the blocks"));
        }
        Ok(())
    }
}

//-----------------------------------------------------------------------------

// Reads the segments in columns `lb..rb` and returns the block and the node rank for each input.
fn read_block<R: MsaReader>(reader: &mut R, lb: usize, rb: usize) -> Result<(Block, Vec<usize>), String> {
    let mut labels: Vec<Vec<u8>> = Vec::with_capacity(reader.handle_count());
    reader.fill_buffer(lb, rb, |spans| {
        for (input, span) in spans.iter().enumerate() {
            let mut label = Vec::with_capacity(span.len());
            utils::remove_gaps(span, &mut label);
            if label.is_empty() {
                return Err(format!("Input {} has an empty segment in columns {}..{}", input, lb, rb));
            }
            if let Some(&c) = label.iter().find(|&&c| c <= SEPARATOR) {
                return Err(format!("Input {} has an invalid character {:?} in columns {}..{}", input, c as char, lb, rb));
            }
            labels.push(label);
        }
        Ok(())
    })?;

    // The map assigns the segments their lexicographic ranks.
    let mut segment_inputs: BTreeMap<&[u8], Vec<usize>> = BTreeMap::new();
    for (input, label) in labels.iter().enumerate() {
        segment_inputs.entry(label.as_slice()).or_default().push(input);
    }

    let mut block = Block::default();
    let mut nodes = vec![0; labels.len()];
    for (rank, (segment, inputs)) in segment_inputs.into_iter().enumerate() {
        for &input in inputs.iter() {
            nodes[input] = rank;
        }
        block.segments.push(segment.to_vec());
        block.inputs.push(inputs);
    }

    Ok((block, nodes))
}

//-----------------------------------------------------------------------------

/// Receives the positions of the segments and edges while the indexable text is written.
///
/// All methods have default implementations that do nothing.
/// An error from any method stops writing the text.
pub trait IndexableTextDelegate {
    /// A segment of the first block starts at `text_offset`.
    fn output_segment(&mut self, _block: usize, _text_offset: usize, _segment: usize, _segment_len: usize) -> Result<(), String> {
        Ok(())
    }

    /// The edge string of `(lhs, rhs)` into `block` starts at `text_offset`.
    fn output_edge(&mut self, _block: usize, _text_offset: usize, _lhs: usize, _rhs: usize, _lhs_len: usize, _rhs_len: usize) -> Result<(), String> {
        Ok(())
    }

    /// The text is complete.
    fn finish(&mut self) -> Result<(), String> {
        Ok(())
    }
}

/// An [`IndexableTextDelegate`] that ignores all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTextDelegate;

impl IndexableTextDelegate for NullTextDelegate {}

/// An [`IndexableTextDelegate`] that writes the contents of each block in TSV format.
///
/// There is one row for each segment, with the following columns:
///
/// * `BLOCK`: block number.
/// * `TEXT_OFFSET`: offset of the first occurrence of the segment in the indexable text.
/// * `PREFIX_COUNT`: number of other segments in the block that start with the segment.
/// * `EDGE_COUNT`: number of distinct in-edges and out-edges of the segment.
/// * `SEGMENT` or `SEGMENT_LENGTH`: the segment, or its length if segments are omitted.
///
/// # Examples
///
/// ```
/// use founder_graph_index::{BlockGraph, InMemoryMsaReader};
/// use founder_graph_index::block_graph::{self, BlockContentsWriter};
///
/// let mut reader = InMemoryMsaReader::from_sequences(&["ACCT", "AGCT"]);
/// let graph = BlockGraph::read_optimized_segmentation(&mut reader, &[2, 4], false).unwrap();
/// let mut contents: Vec<u8> = Vec::new();
/// let mut delegate = BlockContentsWriter::new(&graph, &mut contents, false).unwrap();
/// block_graph::write_indexable_text(&graph, &mut std::io::sink(), &mut delegate).unwrap();
/// drop(delegate);
///
/// let rows = String::from_utf8(contents).unwrap();
/// assert_eq!(rows.lines().nth(1), Some("0\t1\t0\t1\tAC"));
/// assert_eq!(rows.lines().nth(3), Some("1\t9\t0\t2\tCT"));
/// ```
pub struct BlockContentsWriter<'a, W: Write> {
    graph: &'a BlockGraph,
    writer: W,
    omit_segments: bool,
    block: usize,
    // First text offset for each segment of the current block.
    offsets: Vec<Option<usize>>,
}

impl<'a, W: Write> BlockContentsWriter<'a, W> {
    /// Creates a new writer for the graph and writes the header.
    ///
    /// If `omit_segments` is set, the rows contain segment lengths instead of the segments.
    pub fn new(graph: &'a BlockGraph, mut writer: W, omit_segments: bool) -> Result<Self, String> {
        let last = if omit_segments { "SEGMENT_LENGTH" } else { "SEGMENT" };
        writeln!(writer, "BLOCK\tTEXT_OFFSET\tPREFIX_COUNT\tEDGE_COUNT\t{}", last).map_err(|x| x.to_string())?;
        let height = graph.blocks.first().map(|block| block.height()).unwrap_or(0);
        Ok(BlockContentsWriter {
            graph, writer, omit_segments,
            block: 0,
            offsets: vec![None; height],
        })
    }

    fn record(&mut self, block: usize, segment: usize, text_offset: usize) -> Result<(), String> {
        if block != self.block {
            self.write_block()?;
            self.block = block;
            self.offsets = vec![None; self.graph.blocks[block].height()];
        }
        if self.offsets[segment].is_none() {
            self.offsets[segment] = Some(text_offset);
        }
        Ok(())
    }

    fn write_block(&mut self) -> Result<(), String> {
        if self.block >= self.graph.block_count() {
            return Ok(());
        }
        let block = &self.graph.blocks[self.block];
        let mut edges = vec![0; block.height()];
        for &(rhs, _) in block.reverse_in_edges.iter() {
            edges[rhs] += 1;
        }
        if self.block + 1 < self.graph.block_count() {
            for &(_, lhs) in self.graph.blocks[self.block + 1].reverse_in_edges.iter() {
                edges[lhs] += 1;
            }
        }

        for (rank, segment) in block.segments.iter().enumerate() {
            // Segments are sorted, so the extensions of a segment follow it.
            let prefix_count = block.segments[rank + 1..].iter().take_while(|x| x.starts_with(segment)).count();
            let offset = match self.offsets[rank] {
                Some(offset) => offset.to_string(),
                None => String::from("-"),
            };
            write!(self.writer, "{}\t{}\t{}\t{}\t", self.block, offset, prefix_count, edges[rank]).map_err(|x| x.to_string())?;
            if self.omit_segments {
                writeln!(self.writer, "{}", segment.len()).map_err(|x| x.to_string())?;
            } else {
                self.writer.write_all(segment).map_err(|x| x.to_string())?;
                writeln!(self.writer).map_err(|x| x.to_string())?;
            }
        }
        Ok(())
    }
}

impl<'a, W: Write> IndexableTextDelegate for BlockContentsWriter<'a, W> {
    fn output_segment(&mut self, block: usize, text_offset: usize, segment: usize, _segment_len: usize) -> Result<(), String> {
        self.record(block, segment, text_offset)
    }

    fn output_edge(&mut self, block: usize, text_offset: usize, _lhs: usize, rhs: usize, lhs_len: usize, _rhs_len: usize) -> Result<(), String> {
        self.record(block, rhs, text_offset + lhs_len)
    }

    fn finish(&mut self) -> Result<(), String> {
        self.write_block()?;
        self.block = self.graph.blocks.len();
        self.offsets.clear();
        self.writer.flush().map_err(|x| x.to_string())
    }
}

/// Writes the indexable text for the graph.
///
/// The text starts with [`SEPARATOR`].
/// It continues with every segment of the first block followed by a separator.
/// Then, for every later block and every in-edge `(rhs, lhs)` in sorted order, it contains the concatenation of the labels of `lhs` and `rhs` followed by a separator.
/// Returns the length of the text.
pub fn write_indexable_text<W: Write>(graph: &BlockGraph, writer: &mut W, delegate: &mut dyn IndexableTextDelegate) -> Result<usize, String> {
    let mut offset = 0;
    writer.write_all(&[SEPARATOR]).map_err(|x| x.to_string())?;
    offset += 1;

    if let Some(first) = graph.blocks.first() {
        for (rank, segment) in first.segments.iter().enumerate() {
            delegate.output_segment(0, offset, rank, segment.len())?;
            writer.write_all(segment).map_err(|x| x.to_string())?;
            writer.write_all(&[SEPARATOR]).map_err(|x| x.to_string())?;
            offset += segment.len() + 1;
        }
    }

    for block_idx in 1..graph.blocks.len() {
        let lhs_block = &graph.blocks[block_idx - 1];
        let rhs_block = &graph.blocks[block_idx];
        for &(rhs, lhs) in rhs_block.reverse_in_edges.iter() {
            let lhs_segment = &lhs_block.segments[lhs];
            let rhs_segment = &rhs_block.segments[rhs];
            delegate.output_edge(block_idx, offset, lhs, rhs, lhs_segment.len(), rhs_segment.len())?;
            writer.write_all(lhs_segment).map_err(|x| x.to_string())?;
            writer.write_all(rhs_segment).map_err(|x| x.to_string())?;
            writer.write_all(&[SEPARATOR]).map_err(|x| x.to_string())?;
            offset += lhs_segment.len() + rhs_segment.len() + 1;
        }
    }

    writer.flush().map_err(|x| x.to_string())?;
    delegate.finish()?;
    Ok(offset)
}

/// Returns the indexable text for the graph.
///
/// See [`write_indexable_text`].
pub fn indexable_text(graph: &BlockGraph) -> Vec<u8> {
    let mut text: Vec<u8> = Vec::new();
    // Writing to a vector cannot fail.
    let _ = write_indexable_text(graph, &mut text, &mut NullTextDelegate);
    text
}

//-----------------------------------------------------------------------------

fn escape_graphviz(label: &[u8]) -> String {
    String::from_utf8_lossy(label).replace('"', "\\\"")
}

/// Writes the graph in Graphviz format.
///
/// Nodes are named `_<block>_<rank>`.
pub fn write_graphviz<W: Write>(graph: &BlockGraph, writer: &mut W) -> Result<(), String> {
    writeln!(writer, "digraph {{").map_err(|x| x.to_string())?;
    writeln!(writer, "\trankdir=\"LR\"").map_err(|x| x.to_string())?;
    for (block_idx, block) in graph.blocks.iter().enumerate().take(graph.block_count()) {
        for (rank, segment) in block.segments.iter().enumerate() {
            writeln!(writer, "\t_{}_{} [label = \"{}\"]", block_idx, rank, escape_graphviz(segment)).map_err(|x| x.to_string())?;
        }
        for &(rhs, lhs) in block.reverse_in_edges.iter() {
            writeln!(writer, "\t_{}_{} -> _{}_{}", block_idx - 1, lhs, block_idx, rhs).map_err(|x| x.to_string())?;
        }
    }
    writeln!(writer, "}}").map_err(|x| x.to_string())?;
    writer.flush().map_err(|x| x.to_string())?;
    Ok(())
}

//-----------------------------------------------------------------------------
