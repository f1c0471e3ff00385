//! Concurrent construction of the path index support structures.
//!
//! The blocks of the graph are processed in chunks of consecutive blocks by a pool of worker threads.
//! The dispatcher waits for a free buffer before dispatching a chunk, which bounds the number of chunks in flight.
//! Each worker computes the values for its chunk into the buffer ([`ChunkStrategy::process`]) and then moves them to the shared state ([`ChunkStrategy::postprocess`]).
//!
//! The first pass produces prefix class positions in an arbitrary order.
//! Workers merge their sorted position blocks pairwise, and the remaining blocks are merged after the pass.
//! Because merging sorted sequences is associative and commutative, the result does not depend on scheduling.
//! The second pass needs rank support for D, so it only starts after the first pass has been completed.

use crate::block_graph::BlockGraph;
use crate::construction::{self, AlrBuffer, BedinxBuffer, ConstructionDelegate};
use crate::csa::Csa;
use crate::path_index::PathIndexSupport;

use simple_sds::bit_vector::BitVector;
use simple_sds::bits;
use simple_sds::int_vector::IntVector;
use simple_sds::ops::Access;
use simple_sds::raw_vector::{AccessRaw, RawVector};
use simple_sds::sparse_vector::{SparseBuilder, SparseVector};

use parking_lot::Mutex;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;


//-----------------------------------------------------------------------------

/// Parameters for the concurrent construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildParameters {
    /// Number of worker threads.
    pub threads: usize,
    /// Number of consecutive blocks in a chunk.
    pub chunk_size: usize,
    /// Maximum number of chunks in flight.
    pub buffer_count: usize,
    /// Print progress information to stderr.
    pub progress: bool,
}

impl BuildParameters {
    /// Default number of blocks in a chunk.
    pub const DEFAULT_CHUNK_SIZE: usize = 4;

    /// Default number of chunk buffers.
    pub const DEFAULT_BUFFER_COUNT: usize = 16;

    /// Returns parameters with the given number of threads and default values otherwise.
    pub fn with_threads(threads: usize) -> Self {
        BuildParameters { threads, ..Self::default() }
    }
}

impl Default for BuildParameters {
    fn default() -> Self {
        BuildParameters {
            threads: thread::available_parallelism().map(|x| x.get()).unwrap_or(1),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
            buffer_count: Self::DEFAULT_BUFFER_COUNT,
            progress: false,
        }
    }
}

//-----------------------------------------------------------------------------

/// A computation over chunks of blocks, driven by [`dispatch_chunks`].
pub(crate) trait ChunkStrategy: Sync {
    /// Reusable per-chunk buffer.
    type Buffer: Default + Send;

    /// Computes the values for blocks `block_idx..block_end` into the buffer.
    fn process(&self, block_idx: usize, block_end: usize, buffer: &mut Self::Buffer) -> Result<(), String>;

    /// Moves the values from the buffer to the shared state.
    fn postprocess(&self, block_idx: usize, block_end: usize, buffer: &mut Self::Buffer);
}

/// Runs the strategy over blocks `first..end` in chunks using the given number of threads.
///
/// Once a chunk fails, no further chunks are dispatched.
/// Chunks already in flight are completed before returning the first error.
pub(crate) fn dispatch_chunks<S: ChunkStrategy>(strategy: &S, first: usize, end: usize, params: &BuildParameters) -> Result<(), String> {
    let threads = params.threads.max(1);
    let chunk_size = params.chunk_size.max(1);
    let buffer_count = params.buffer_count.max(1);

    let (to_worker, from_dispatcher) = mpsc::sync_channel::<(usize, usize, S::Buffer)>(buffer_count);
    let from_dispatcher = Mutex::new(from_dispatcher);
    let (to_free, free_buffers) = mpsc::sync_channel::<S::Buffer>(buffer_count);
    for _ in 0..buffer_count {
        // The channel has room for all buffers.
        let _ = to_free.send(S::Buffer::default());
    }
    let abort = AtomicBool::new(false);
    let error: Mutex<Option<String>> = Mutex::new(None);

    thread::scope(|scope| {
        for _ in 0..threads {
            let to_free = to_free.clone();
            let from_dispatcher = &from_dispatcher;
            let abort = &abort;
            let error = &error;
            scope.spawn(move || loop {
                // This fails once the dispatcher is done.
                let job = from_dispatcher.lock().recv();
                let (block_idx, block_end, mut buffer) = match job {
                    Ok(job) => job,
                    Err(_) => return,
                };
                if !abort.load(Ordering::Relaxed) {
                    match strategy.process(block_idx, block_end, &mut buffer) {
                        Ok(()) => strategy.postprocess(block_idx, block_end, &mut buffer),
                        Err(message) => {
                            abort.store(true, Ordering::Relaxed);
                            error.lock().get_or_insert(message);
                        },
                    }
                }
                // At most `buffer_count` buffers exist and `free_buffers` outlives the workers, so this cannot fail or block.
                let _ = to_free.send(buffer);
            });
        }

        let mut block_idx = first;
        while block_idx < end && !abort.load(Ordering::Relaxed) {
            let buffer = match free_buffers.recv() {
                Ok(buffer) => buffer,
                Err(_) => break,
            };
            if abort.load(Ordering::Relaxed) {
                break;
            }
            let block_end = end.min(block_idx + chunk_size);
            if to_worker.send((block_idx, block_end, buffer)).is_err() {
                break;
            }
            block_idx = block_end;
        }
        drop(to_worker);
    });

    match error.into_inner() {
        Some(message) => Err(message),
        None => Ok(()),
    }
}

//-----------------------------------------------------------------------------

/// The values stored for a prefix class.
///
/// The order is primarily by the left bound of the lexicographic range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct ClassPosition {
    pub b: usize,
    pub block: usize,
    pub e: usize,
    pub prefix_len: usize,
}

/// A sorted sequence of class positions from one or more chunks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PositionBlock {
    pub positions: Vec<ClassPosition>,
    // Number of chunks merged into this block.
    pub chunks: usize,
}

impl PositionBlock {
    pub fn new(buffer: &BedinxBuffer) -> Self {
        let mut positions: Vec<ClassPosition> = (0..buffer.b_positions.len()).map(|i| ClassPosition {
            b: buffer.b_positions[i],
            block: buffer.block_numbers[i],
            e: buffer.e_positions[i],
            prefix_len: buffer.shortest_prefix_lengths[i],
        }).collect();
        positions.sort_unstable();
        PositionBlock { positions, chunks: 1 }
    }

    pub fn merge(self, other: PositionBlock) -> PositionBlock {
        let mut positions = Vec::with_capacity(self.positions.len() + other.positions.len());
        let mut left = self.positions.into_iter().peekable();
        let mut right = other.positions.into_iter().peekable();
        loop {
            let take_left = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => l <= r,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_left { left.next() } else { right.next() };
            positions.extend(next);
        }
        PositionBlock { positions, chunks: self.chunks + other.chunks }
    }
}

/// Merges the remaining position blocks, starting from the smallest ones.
pub(crate) fn merge_remaining(mut blocks: Vec<PositionBlock>) -> PositionBlock {
    blocks.sort_by_key(|block| block.chunks);
    blocks.into_iter().fold(PositionBlock::default(), |acc, block| acc.merge(block))
}

//-----------------------------------------------------------------------------

struct BedinxState {
    d_positions: Vec<usize>,
    i_positions: Vec<usize>,
    u: RawVector,
}

struct BedinxStrategy<'a> {
    csa: &'a Csa,
    reverse_csa: &'a Csa,
    graph: &'a BlockGraph,
    u_row_size: usize,
    delegate: &'a dyn ConstructionDelegate,
    state: Mutex<BedinxState>,
    pending: Mutex<Vec<PositionBlock>>,
}

impl<'a> BedinxStrategy<'a> {
    // Merges the block with pending blocks of the same size until there are none.
    fn convey_and_merge(&self, mut block: PositionBlock) {
        loop {
            let other = {
                let mut pending = self.pending.lock();
                match pending.iter().position(|x| x.chunks == block.chunks) {
                    Some(i) => pending.swap_remove(i),
                    None => {
                        pending.push(block);
                        return;
                    },
                }
            };
            block = block.merge(other);
        }
    }
}

impl<'a> ChunkStrategy for BedinxStrategy<'a> {
    type Buffer = BedinxBuffer;

    fn process(&self, block_idx: usize, block_end: usize, buffer: &mut Self::Buffer) -> Result<(), String> {
        construction::bedinx_positions_for_range(
            self.csa, self.reverse_csa, self.graph, self.u_row_size,
            block_idx, block_end, buffer, self.delegate
        )
    }

    fn postprocess(&self, _: usize, _: usize, buffer: &mut Self::Buffer) {
        self.convey_and_merge(PositionBlock::new(buffer));
        let mut state = self.state.lock();
        state.d_positions.extend_from_slice(&buffer.d_positions);
        state.i_positions.extend_from_slice(&buffer.i_positions);
        for &pos in buffer.u_positions.iter() {
            state.u.set_bit(pos, true);
        }
    }
}

//-----------------------------------------------------------------------------

struct AlrState {
    a: IntVector,
    a_tilde: IntVector,
    l: IntVector,
    r: IntVector,
}

struct AlrStrategy<'a> {
    csa: &'a Csa,
    reverse_csa: &'a Csa,
    graph: &'a BlockGraph,
    d: &'a SparseVector,
    delegate: &'a dyn ConstructionDelegate,
    state: Mutex<AlrState>,
}

impl<'a> ChunkStrategy for AlrStrategy<'a> {
    type Buffer = AlrBuffer;

    fn process(&self, block_idx: usize, block_end: usize, buffer: &mut Self::Buffer) -> Result<(), String> {
        construction::alr_values_for_range(
            self.csa, self.reverse_csa, self.graph, self.d,
            block_idx, block_end, buffer, self.delegate
        )
    }

    fn postprocess(&self, _: usize, _: usize, buffer: &mut Self::Buffer) {
        let mut state = self.state.lock();
        for values in buffer.iter() {
            state.a.set(values.alpha, values.a as u64);
            state.a_tilde.set(values.alpha_tilde, values.a_tilde as u64);
            state.l.set(values.alpha_tilde, values.lr as u64);
            state.r.set(values.alpha, values.lr as u64);
        }
    }
}

//-----------------------------------------------------------------------------

// Helpers for building the final structures.

fn width_for(max_value: usize) -> usize {
    bits::bit_len(max_value as u64).max(1)
}

fn max_for_width(width: usize) -> u64 {
    if width >= 64 { u64::MAX } else { (1u64 << width) - 1 }
}

/// Builds a sparse vector from strictly increasing positions.
pub(crate) fn sparse_vector(universe: usize, positions: &[usize]) -> Result<SparseVector, String> {
    let mut builder = SparseBuilder::new(universe, positions.len())?;
    for (i, &pos) in positions.iter().enumerate() {
        if pos >= universe || (i > 0 && positions[i - 1] >= pos) {
            return Err(format!("Invalid sparse vector position {} for universe {}", pos, universe));
        }
        builder.set(pos);
    }
    SparseVector::try_from(builder)
}

/// Builds an integer vector of the given width from the values.
pub(crate) fn int_vector<I: Iterator<Item = usize>>(values: I, len: usize, width: usize) -> Result<IntVector, String> {
    let mut result = IntVector::with_len(len, width, 0)?;
    for (i, value) in values.enumerate() {
        result.set(i, value as u64);
    }
    Ok(result)
}

/// Builds a bitvector with zeros terminating unary codes for the given values.
///
/// The bitvector starts with a zero and continues with `value` ones and a zero for each value.
/// The remaining bits are ones.
pub(crate) fn unary_bit_vector<I: Iterator<Item = usize>>(values: I, len: usize) -> Result<BitVector, String> {
    let mut raw = RawVector::with_len(len, true);
    let mut pos = 0;
    if len > 0 {
        raw.set_bit(0, false);
    }
    for value in values {
        pos += value + 1;
        if pos >= len {
            return Err(format!("Unary code position {} exceeds length {}", pos, len));
        }
        raw.set_bit(pos, false);
    }
    let mut result = BitVector::from(raw);
    result.enable_rank();
    result.enable_select_zero();
    Ok(result)
}

// Sorts the positions and reports the first duplicate.
fn sort_unique(mut positions: Vec<usize>, structure: &str, delegate: &dyn ConstructionDelegate) -> Result<Vec<usize>, String> {
    positions.sort_unstable();
    if let Some(w) = positions.windows(2).find(|w| w[0] == w[1]) {
        delegate.position_already_set(structure, w[0]);
        return Err(format!("Position {} in {} already set", w[0], structure));
    }
    Ok(positions)
}

//-----------------------------------------------------------------------------

/// Builds the path index support structures for the graph.
///
/// `csa` and `reverse_csa` must be the indexes for the indexable text of the graph and its reverse.
///
/// # Errors
///
/// Returns an error after any integrity violation reported to the delegate.
/// Also passes through errors from building the structures.
///
/// # Panics
///
/// Panics if the indexes have different sizes.
pub fn build_supporting_data_structures(
    graph: &BlockGraph,
    csa: &Csa, reverse_csa: &Csa,
    params: &BuildParameters,
    delegate: &dyn ConstructionDelegate
) -> Result<PathIndexSupport, String> {
    assert_eq!(csa.size(), reverse_csa.size(), "The forward and the reverse index have different sizes");
    let block_count = graph.block_count();
    let csa_size = csa.size();
    let u_row_size = construction::u_row_size(graph.input_count);
    let alpha_tilde_count = 2 + graph.first_block_segment_count() + graph.edge_count;

    delegate.reading_bit_vector_values();
    let bedinx = BedinxStrategy {
        csa, reverse_csa, graph, u_row_size, delegate,
        state: Mutex::new(BedinxState {
            d_positions: Vec::with_capacity(graph.edge_count),
            i_positions: Vec::with_capacity(graph.node_count),
            u: RawVector::with_len(graph.node_count * u_row_size, false),
        }),
        pending: Mutex::new(Vec::new()),
    };
    dispatch_chunks(&bedinx, 0, block_count, params)?;

    delegate.processing_bit_vector_values();
    let classes = merge_remaining(bedinx.pending.into_inner()).positions;
    if let Some(w) = classes.windows(2).find(|w| w[0].b == w[1].b) {
        delegate.position_already_set("B", w[0].b);
        return Err(format!("Position {} in B already set", w[0].b));
    }
    let state = bedinx.state.into_inner();
    let d_positions = sort_unique(state.d_positions, "D", delegate)?;
    let mut i_positions = state.i_positions;
    i_positions.sort_unstable();
    i_positions.dedup();

    let b_positions: Vec<usize> = classes.iter().map(|x| x.b).collect();
    let b = sparse_vector(csa_size, &b_positions)?;
    let e = int_vector(classes.iter().map(|x| x.e), classes.len(), width_for(csa_size))?;
    let n = int_vector(classes.iter().map(|x| x.block), classes.len(), width_for(block_count))?;
    let x = unary_bit_vector(classes.iter().map(|x| x.prefix_len), 1 + graph.node_count + graph.node_label_length_sum)?;
    let d = sparse_vector(csa_size, &d_positions)?;
    let i = sparse_vector(csa_size, &i_positions)?;

    let real_blocks = &graph.blocks[..block_count];
    let bh = unary_bit_vector(real_blocks.iter().map(|block| block.height()), 1 + graph.blocks.len() + graph.node_count)?;
    let aligned_positions: Vec<usize> = real_blocks.iter().map(|block| block.aligned_position).collect();
    let m = sparse_vector(graph.aligned_size, &aligned_positions)?;

    delegate.filling_integer_vectors();
    let bits_h = width_for(graph.max_block_height);
    let bits_2h = width_for(2 * graph.max_block_height);
    let alr = AlrStrategy {
        csa, reverse_csa, graph, d: &d, delegate,
        state: Mutex::new(AlrState {
            a: IntVector::with_len(graph.edge_count, bits_h, max_for_width(bits_h))?,
            a_tilde: IntVector::with_len(alpha_tilde_count, bits_h, max_for_width(bits_h))?,
            l: IntVector::with_len(alpha_tilde_count, bits_2h, max_for_width(bits_2h))?,
            r: IntVector::with_len(graph.edge_count, bits_2h, max_for_width(bits_2h))?,
        }),
    };
    dispatch_chunks(&alr, 1, block_count, params)?;
    let alr_state = alr.state.into_inner();

    if params.progress {
        eprintln!(
            "Support structures: {} prefix classes, {} edges, U row size {}",
            classes.len(), d_positions.len(), u_row_size
        );
    }

    let mut support = PathIndexSupport {
        b, e, d, i, x, bh, m, n,
        a: alr_state.a,
        a_tilde: alr_state.a_tilde,
        l: alr_state.l,
        r: alr_state.r,
        u: state.u,
        input_count: graph.input_count,
        u_row_size,
    };
    support.update_support();
    Ok(support)
}

//-----------------------------------------------------------------------------
