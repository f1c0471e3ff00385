use crate::{BlockGraph, BuildParameters, InMemoryMsaReader, LoggingDelegate, PathIndex};
use crate::utils;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use std::collections::BTreeSet;

//-----------------------------------------------------------------------------

// Alignments and block graphs.

// Two inputs: AC -> CT and AG -> CT.
pub(crate) fn two_block_alignment() -> (Vec<Vec<u8>>, Vec<usize>) {
    (vec![b"ACCT".to_vec(), b"AGCT".to_vec()], vec![2, 4])
}

// Three inputs: AC -> GT -> TA, AG -> GT -> TC, AC -> CT -> TC.
pub(crate) fn three_block_alignment() -> (Vec<Vec<u8>>, Vec<usize>) {
    (
        vec![b"ACGTTA".to_vec(), b"AGGTTC".to_vec(), b"ACCTTC".to_vec()],
        vec![2, 4, 6]
    )
}

pub(crate) fn block_graph<T: AsRef<[u8]>>(sequences: &[T], bounds: &[usize]) -> BlockGraph {
    let mut reader = InMemoryMsaReader::from_sequences(sequences);
    let graph = BlockGraph::read_optimized_segmentation(&mut reader, bounds, false);
    assert!(graph.is_ok(), "Failed to build the block graph: {}", graph.unwrap_err());
    let graph = graph.unwrap();
    let result = graph.check_invariants();
    assert!(result.is_ok(), "Invalid block graph: {}", result.unwrap_err());
    graph
}

pub(crate) fn two_block_graph() -> BlockGraph {
    let (sequences, bounds) = two_block_alignment();
    block_graph(&sequences, &bounds)
}

pub(crate) fn three_block_graph() -> BlockGraph {
    let (sequences, bounds) = three_block_alignment();
    block_graph(&sequences, &bounds)
}

//-----------------------------------------------------------------------------

// Random alignments.

// Each block has 1 to 3 variants of width 4 to 7, and each input chooses one of them.
// With `prefix_variants`, a block may also contain a proper prefix of its first variant padded with gaps.
pub(crate) fn random_alignment(rng: &mut StdRng, inputs: usize, blocks: usize, prefix_variants: bool) -> (Vec<Vec<u8>>, Vec<usize>) {
    let mut sequences: Vec<Vec<u8>> = vec![Vec::new(); inputs];
    let mut bounds: Vec<usize> = Vec::with_capacity(blocks);
    for _ in 0..blocks {
        let width = rng.gen_range(4..=7);
        let variant_count = rng.gen_range(1..=3);
        let mut variants: Vec<Vec<u8>> = (0..variant_count).map(|_| {
            (0..width).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
        }).collect();
        if prefix_variants && rng.gen_bool(0.6) {
            let mut truncated = variants[0][..rng.gen_range(1..width)].to_vec();
            truncated.resize(width, utils::GAP);
            variants.push(truncated);
        }
        for sequence in sequences.iter_mut() {
            sequence.extend_from_slice(&variants[rng.gen_range(0..variants.len())]);
        }
        bounds.push(sequences[0].len());
    }
    (sequences, bounds)
}

// Returns the node labels on the path of each input.
pub(crate) fn paths<T: AsRef<[u8]>>(sequences: &[T], bounds: &[usize]) -> Vec<Vec<Vec<u8>>> {
    sequences.iter().map(|sequence| {
        let sequence = sequence.as_ref();
        let mut start = 0;
        bounds.iter().map(|&end| {
            let label: Vec<u8> = sequence[start..end].iter().copied().filter(|&c| c != utils::GAP).collect();
            start = end;
            label
        }).collect()
    }).collect()
}

// Path strings with the offsets of the nodes.
fn path_texts(paths: &[Vec<Vec<u8>>]) -> Vec<(Vec<u8>, Vec<usize>)> {
    paths.iter().map(|path| {
        let mut starts: Vec<usize> = Vec::with_capacity(path.len());
        let mut node_start = 0;
        for node in path.iter() {
            starts.push(node_start);
            node_start += node.len();
        }
        (path.concat(), starts)
    }).collect()
}

// Calls `accept(path, node_starts, block, label, offset)` for every occurrence of every node label in every path string.
// Returns `false` if an occurrence is rejected.
fn all_label_occurrences<T, F>(sequences: &[T], bounds: &[usize], accept: F) -> bool
    where T: AsRef<[u8]>, F: Fn(&[Vec<u8>], &[usize], usize, &[u8], usize) -> bool
{
    let paths = paths(sequences, bounds);
    let texts = path_texts(&paths);
    for (block, label) in paths.iter().flat_map(|path| path.iter().enumerate()) {
        for (path, (text, starts)) in paths.iter().zip(texts.iter()) {
            for offset in 0..(text.len() + 1).saturating_sub(label.len()) {
                if &text[offset..offset + label.len()] == label.as_slice() && !accept(path.as_slice(), starts.as_slice(), block, label.as_slice(), offset) {
                    return false;
                }
            }
        }
    }
    true
}

// Every node label occurs in the path strings only as the label of its own node.
pub(crate) fn is_repeat_free<T: AsRef<[u8]>>(sequences: &[T], bounds: &[usize]) -> bool {
    all_label_occurrences(sequences, bounds, |path, starts, block, label, offset| {
        starts[block] == offset && path[block] == label
    })
}

// Every node label occurs in the path strings only at the start of a node in its own block.
// The occurrence may extend past the end of that node.
pub(crate) fn is_semi_repeat_free<T: AsRef<[u8]>>(sequences: &[T], bounds: &[usize]) -> bool {
    all_label_occurrences(sequences, bounds, |_, starts, block, _, offset| starts[block] == offset)
}

// Returns `true` if a node label is a proper prefix of another label in the same block.
pub(crate) fn has_prefix_labels<T: AsRef<[u8]>>(sequences: &[T], bounds: &[usize]) -> bool {
    let paths = paths(sequences, bounds);
    (0..bounds.len()).any(|block| {
        let labels: BTreeSet<&[u8]> = paths.iter().map(|path| path[block].as_slice()).collect();
        let labels: Vec<&[u8]> = labels.into_iter().collect();
        labels.windows(2).any(|pair| pair[1].starts_with(pair[0]))
    })
}

// Returns a random repeat-free alignment.
pub(crate) fn repeat_free_alignment(seed: u64, inputs: usize, blocks: usize) -> (Vec<Vec<u8>>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..10000 {
        let (sequences, bounds) = random_alignment(&mut rng, inputs, blocks, false);
        if is_repeat_free(&sequences, &bounds) {
            return (sequences, bounds);
        }
    }
    panic!("Could not generate a repeat-free alignment with seed {}", seed);
}

// Returns a random semi-repeat-free alignment where some label is a prefix of another label in the same block.
pub(crate) fn semi_repeat_free_alignment(seed: u64, inputs: usize, blocks: usize) -> (Vec<Vec<u8>>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..10000 {
        let (sequences, bounds) = random_alignment(&mut rng, inputs, blocks, true);
        if has_prefix_labels(&sequences, &bounds) && is_semi_repeat_free(&sequences, &bounds) {
            return (sequences, bounds);
        }
    }
    panic!("Could not generate a semi-repeat-free alignment with seed {}", seed);
}

// Returns the inputs whose path string contains the pattern.
pub(crate) fn inputs_containing<T: AsRef<[u8]>>(sequences: &[T], bounds: &[usize], pattern: &[u8]) -> Vec<usize> {
    paths(sequences, bounds).iter().enumerate().filter_map(|(input, path)| {
        let text: Vec<u8> = path.concat();
        if text.windows(pattern.len()).any(|window| window == pattern) { Some(input) } else { None }
    }).collect()
}

//-----------------------------------------------------------------------------

// Path indexes.

pub(crate) fn build_path_index(graph: &BlockGraph, threads: usize) -> PathIndex {
    let params = BuildParameters::with_threads(threads);
    let index = PathIndex::build(graph, &params, &LoggingDelegate::new(false));
    assert!(index.is_ok(), "Failed to build the path index: {}", index.unwrap_err());
    index.unwrap()
}

//-----------------------------------------------------------------------------
