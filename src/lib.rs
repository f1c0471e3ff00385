//! # Founder graph index: listing the input sequences that contain a pattern.
//!
//! A founder graph is built from a multiple sequence alignment (MSA) and a segmentation of its columns into blocks.
//! Each block contains one node for each distinct gap-free segment of the input sequences in the block.
//! An edge connects two nodes in adjacent blocks if an input sequence continues from one to the other.
//!
//! The path index is a pair of FM-indexes for the indexable text of the graph and its reverse, with succinct support structures.
//! Given a pattern that crosses at least one block boundary, the index lists the inputs whose paths spell the pattern.
//! The listing is exact when the graph is semi-repeat-free: every node label occurs in the path strings only at the start of a node in its own block.
//! A label may still be a prefix of another label in the same block.
//!
//! ### Basic concepts
//!
//! The MSA is read through an [`MsaReader`].
//! [`BlockGraph::read_optimized_segmentation`] builds the graph from the reader and the right bounds of the blocks.
//! Node labels within a block are sorted, and nodes are identified by their ranks, both within the block and globally.
//!
//! The indexable text consists of the labels of the nodes in the first block and the concatenated labels of the endpoints of every edge, each followed by a separator `#`.
//! See [`block_graph::write_indexable_text`] and [`Csa`].
//!
//! [`PathIndex::build`] builds the index using multiple threads (see [`builder`] and [`BuildParameters`]).
//! Integrity violations during construction are reported to a [`ConstructionDelegate`] and make the construction fail.
//! [`PathIndex::list_occurrences`] answers queries.
//!
//! # Examples
//!
//! ```
//! use founder_graph_index::{BlockGraph, BuildParameters, InMemoryMsaReader, LoggingDelegate, PathIndex};
//!
//! let mut reader = InMemoryMsaReader::from_sequences(&["ACGTTA", "AGGTTC", "ACCTTC"]);
//! let graph = BlockGraph::read_optimized_segmentation(&mut reader, &[2, 4, 6], false).unwrap();
//! assert_eq!(graph.node_count, 6);
//!
//! let index = PathIndex::build(&graph, &BuildParameters::default(), &LoggingDelegate::new(false)).unwrap();
//! let result = index.list_occurrences(b"GTT");
//! assert_eq!(result.occurrences, vec![0, 1]);
//! assert_eq!(result.block_aln_pos, 2);
//! ```

pub mod block_graph;
pub mod builder;
pub mod construction;
pub mod csa;
pub mod msa;
pub mod path_index;
pub mod utils;

pub use block_graph::{BlockGraph, Block, SEPARATOR};
pub use builder::BuildParameters;
pub use construction::{ConstructionDelegate, LoggingDelegate};
pub use csa::{Csa, LexRange, RangePair};
pub use msa::{InMemoryMsaReader, MsaReader, TextMsaReader};
pub use path_index::{PathIndex, QueryResult};

#[cfg(test)]
pub(crate) mod internal;
