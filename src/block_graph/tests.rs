use super::*;

use crate::msa::InMemoryMsaReader;
use crate::internal;

//-----------------------------------------------------------------------------

fn segments(block: &Block) -> Vec<&[u8]> {
    block.segments.iter().map(|x| x.as_slice()).collect()
}

#[derive(Default)]
struct RecordingDelegate {
    segments: Vec<(usize, usize, usize, usize)>,
    edges: Vec<(usize, usize, usize, usize, usize, usize)>,
    finished: bool,
    fail_at_edge: Option<usize>,
}

impl IndexableTextDelegate for RecordingDelegate {
    fn output_segment(&mut self, block: usize, text_offset: usize, segment: usize, segment_len: usize) -> Result<(), String> {
        self.segments.push((block, text_offset, segment, segment_len));
        Ok(())
    }

    fn output_edge(&mut self, block: usize, text_offset: usize, lhs: usize, rhs: usize, lhs_len: usize, rhs_len: usize) -> Result<(), String> {
        self.edges.push((block, text_offset, lhs, rhs, lhs_len, rhs_len));
        if self.fail_at_edge == Some(self.edges.len()) {
            return Err(format!("Failed at edge {}", self.edges.len()));
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), String> {
        self.finished = true;
        Ok(())
    }
}

//-----------------------------------------------------------------------------

#[test]
fn two_block_graph() {
    let (sequences, bounds) = internal::two_block_alignment();
    let graph = internal::block_graph(&sequences, &bounds);

    assert_eq!(graph.block_count(), 2, "Wrong number of blocks");
    assert_eq!(graph.blocks.len(), 3, "Missing sentinel block");
    assert_eq!(graph.node_count, 3, "Wrong number of nodes");
    assert_eq!(graph.edge_count, 2, "Wrong number of edges");
    assert_eq!(graph.node_label_length_sum, 6, "Wrong total label length");
    assert_eq!(graph.node_label_max_length, 2, "Wrong maximum label length");
    assert_eq!(graph.aligned_size, 4, "Wrong aligned size");
    assert_eq!(graph.input_count, 2, "Wrong number of inputs");
    assert_eq!(graph.max_block_height, 2, "Wrong maximum block height");
    assert_eq!(graph.first_block_segment_count(), 2, "Wrong first block height");

    let first = &graph.blocks[0];
    assert_eq!(segments(first), vec![b"AC".as_slice(), b"AG".as_slice()], "Wrong segments in block 0");
    assert_eq!(first.inputs, vec![vec![0], vec![1]], "Wrong inputs in block 0");
    assert!(first.reverse_in_edges.is_empty(), "The first block should not have in-edges");
    assert_eq!((first.aligned_position, first.node_csum, first.node_label_length_csum), (0, 0, 0), "Wrong positions for block 0");

    let second = &graph.blocks[1];
    assert_eq!(segments(second), vec![b"CT".as_slice()], "Wrong segments in block 1");
    assert_eq!(second.inputs, vec![vec![0, 1]], "Wrong inputs in block 1");
    let edges: Vec<(usize, usize)> = second.reverse_in_edges.iter().copied().collect();
    assert_eq!(edges, vec![(0, 0), (0, 1)], "Wrong in-edges for block 1");
    assert_eq!((second.aligned_position, second.node_csum, second.node_label_length_csum), (2, 2, 4), "Wrong positions for block 1");

    let sentinel = &graph.blocks[2];
    assert!(sentinel.is_empty(), "The sentinel should not have segments");
    assert!(sentinel.reverse_in_edges.is_empty(), "The sentinel should not have edges");
    assert_eq!((sentinel.aligned_position, sentinel.node_csum, sentinel.node_label_length_csum), (4, 3, 6), "Wrong totals in the sentinel");
}

#[test]
fn segments_are_sorted_and_deduplicated() {
    let sequences = [b"TTAC", b"GGAC", b"TTGA", b"GGAC"];
    let graph = internal::block_graph(&sequences, &[2, 4]);

    assert_eq!(segments(&graph.blocks[0]), vec![b"GG".as_slice(), b"TT".as_slice()], "Wrong segments in block 0");
    assert_eq!(graph.blocks[0].inputs, vec![vec![1, 3], vec![0, 2]], "Wrong inputs in block 0");
    assert_eq!(segments(&graph.blocks[1]), vec![b"AC".as_slice(), b"GA".as_slice()], "Wrong segments in block 1");
    assert_eq!(graph.blocks[1].inputs, vec![vec![0, 1, 3], vec![2]], "Wrong inputs in block 1");

    let edges: Vec<(usize, usize)> = graph.blocks[1].reverse_in_edges.iter().copied().collect();
    assert_eq!(edges, vec![(0, 0), (0, 1), (1, 1)], "Wrong in-edges for block 1");
    assert_eq!(graph.edge_count, 3, "Duplicate edges should be merged");
}

#[test]
fn gaps_are_removed() {
    let sequences = [b"A-CG-T", b"AC-GT-", b"ACCGTT"];
    let graph = internal::block_graph(&sequences, &[3, 6]);

    assert_eq!(segments(&graph.blocks[0]), vec![b"AC".as_slice(), b"ACC".as_slice()], "Wrong segments in block 0");
    assert_eq!(graph.blocks[0].inputs, vec![vec![0, 1], vec![2]], "Wrong inputs in block 0");
    assert_eq!(segments(&graph.blocks[1]), vec![b"GT".as_slice(), b"GTT".as_slice()], "Wrong segments in block 1");
    assert_eq!(graph.node_label_max_length, 3, "Wrong maximum label length");
    assert_eq!(graph.node_label(1), Some(b"ACC".as_slice()), "Wrong label for node 1");
    assert_eq!(graph.node_label(3), Some(b"GTT".as_slice()), "Wrong label for node 3");
    assert_eq!(graph.node_label(4), None, "Got a label for a nonexistent node");
}

#[test]
fn invalid_segmentations() {
    let (sequences, _) = internal::two_block_alignment();

    let mut reader = InMemoryMsaReader::from_sequences(&sequences);
    assert!(BlockGraph::read_optimized_segmentation(&mut reader, &[2, 3], false).is_err(), "Accepted bounds that do not cover the alignment");
    assert!(BlockGraph::read_optimized_segmentation(&mut reader, &[], false).is_err(), "Accepted an empty segmentation");
    assert!(BlockGraph::read_optimized_segmentation(&mut reader, &[2, 2, 4], false).is_err(), "Accepted an empty block");

    let gapped = [b"AC--", b"ACGT"];
    let mut reader = InMemoryMsaReader::from_sequences(&gapped);
    assert!(BlockGraph::read_optimized_segmentation(&mut reader, &[2, 4], false).is_err(), "Accepted an empty segment");

    let separator = [b"A#GT", b"ACGT"];
    let mut reader = InMemoryMsaReader::from_sequences(&separator);
    assert!(BlockGraph::read_optimized_segmentation(&mut reader, &[2, 4], false).is_err(), "Accepted a separator in a segment");

    let mut reader = InMemoryMsaReader::new();
    assert!(BlockGraph::read_optimized_segmentation(&mut reader, &[], false).is_err(), "Accepted an empty alignment");
}

//-----------------------------------------------------------------------------

#[test]
fn indexable_text_layout() {
    let (sequences, bounds) = internal::two_block_alignment();
    let graph = internal::block_graph(&sequences, &bounds);
    assert_eq!(indexable_text(&graph), b"#AC#AG#ACCT#AGCT#".to_vec(), "Wrong indexable text");

    let (sequences, bounds) = internal::three_block_alignment();
    let graph = internal::block_graph(&sequences, &bounds);
    let text = indexable_text(&graph);
    assert_eq!(text.first(), Some(&SEPARATOR), "The text should start with a separator");
    assert_eq!(text.last(), Some(&SEPARATOR), "The text should end with a separator");
    let separators = text.iter().filter(|&&c| c == SEPARATOR).count();
    assert_eq!(separators, 1 + graph.first_block_segment_count() + graph.edge_count, "Wrong number of separators");
}

#[test]
fn indexable_text_delegate() {
    let (sequences, bounds) = internal::two_block_alignment();
    let graph = internal::block_graph(&sequences, &bounds);

    let mut text: Vec<u8> = Vec::new();
    let mut delegate = RecordingDelegate::default();
    let len = write_indexable_text(&graph, &mut text, &mut delegate);
    assert!(len.is_ok(), "Failed to write the indexable text: {}", len.unwrap_err());
    assert_eq!(len.unwrap(), text.len(), "Wrong reported text length");

    assert_eq!(delegate.segments, vec![(0, 1, 0, 2), (0, 4, 1, 2)], "Wrong segment events");
    assert_eq!(delegate.edges, vec![(1, 7, 0, 0, 2, 2), (1, 12, 1, 0, 2, 2)], "Wrong edge events");
    assert!(delegate.finished, "The delegate was not notified at the end");

    for &(_, offset, segment, len) in delegate.segments.iter() {
        assert_eq!(&text[offset..offset + len], graph.blocks[0].segments[segment].as_slice(), "Wrong segment at offset {}", offset);
    }
}

#[test]
fn delegate_failure() {
    let (sequences, bounds) = internal::three_block_alignment();
    let graph = internal::block_graph(&sequences, &bounds);

    let mut text: Vec<u8> = Vec::new();
    let mut delegate = RecordingDelegate { fail_at_edge: Some(2), ..RecordingDelegate::default() };
    let result = write_indexable_text(&graph, &mut text, &mut delegate);
    assert_eq!(result, Err(String::from("Failed at edge 2")), "The delegate error was not passed through");
    assert_eq!(delegate.edges.len(), 2, "Text writing continued after the error");
    assert!(!delegate.finished, "The delegate was notified at the end after an error");
}

fn block_contents(graph: &BlockGraph, omit_segments: bool) -> Vec<String> {
    let mut contents: Vec<u8> = Vec::new();
    let mut text: Vec<u8> = Vec::new();
    {
        let delegate = BlockContentsWriter::new(graph, &mut contents, omit_segments);
        assert!(delegate.is_ok(), "Failed to create the block contents writer: {}", delegate.err().unwrap());
        let mut delegate = delegate.ok().unwrap();
        let result = write_indexable_text(graph, &mut text, &mut delegate);
        assert!(result.is_ok(), "Failed to write the indexable text: {}", result.unwrap_err());
    }
    let contents = String::from_utf8(contents).unwrap();
    contents.lines().map(String::from).collect()
}

#[test]
fn block_contents_tsv() {
    // #A#AG#AGCC#AGT#
    let graph = internal::block_graph(&["A-GT", "AGCC"], &[2, 4]);
    let rows = block_contents(&graph, false);
    assert_eq!(rows, vec![
        "BLOCK\tTEXT_OFFSET\tPREFIX_COUNT\tEDGE_COUNT\tSEGMENT",
        "0\t1\t1\t1\tA",
        "0\t3\t0\t1\tAG",
        "1\t8\t0\t1\tCC",
        "1\t12\t0\t1\tGT",
    ], "Wrong block contents");

    let rows = block_contents(&graph, true);
    assert_eq!(rows.first().map(|x| x.as_str()), Some("BLOCK\tTEXT_OFFSET\tPREFIX_COUNT\tEDGE_COUNT\tSEGMENT_LENGTH"), "Wrong header without segments");
    let lengths: Vec<&str> = rows[1..].iter().filter_map(|row| row.split('\t').last()).collect();
    assert_eq!(lengths, vec!["1", "2", "2", "2"], "Wrong segment lengths");
}

#[test]
fn block_contents_offsets() {
    let (sequences, bounds) = internal::three_block_alignment();
    let graph = internal::block_graph(&sequences, &bounds);
    let text = indexable_text(&graph);
    let rows = block_contents(&graph, false);
    assert_eq!(rows.len(), 1 + graph.node_count, "Wrong number of rows");

    let mut edges = 0;
    for row in rows[1..].iter() {
        let fields: Vec<&str> = row.split('\t').collect();
        assert_eq!(fields.len(), 5, "Wrong number of fields in row {}", row);
        let offset: usize = fields[1].parse().unwrap();
        let segment = fields[4].as_bytes();
        assert_eq!(&text[offset..offset + segment.len()], segment, "Wrong text offset in row {}", row);
        edges += fields[3].parse::<usize>().unwrap();
    }
    // Each edge is an out-edge of one segment and an in-edge of another.
    assert_eq!(edges, 2 * graph.edge_count, "Wrong total edge count");
}

#[test]
fn graphviz_output() {
    let (sequences, bounds) = internal::two_block_alignment();
    let graph = internal::block_graph(&sequences, &bounds);

    let mut output: Vec<u8> = Vec::new();
    let result = write_graphviz(&graph, &mut output);
    assert!(result.is_ok(), "Failed to write Graphviz: {}", result.unwrap_err());
    let output = String::from_utf8(output).unwrap();
    assert!(output.starts_with("digraph {"), "Missing graph header");
    assert!(output.contains("_0_1 [label = \"AG\"]"), "Missing node _0_1");
    assert!(output.contains("_1_0 [label = \"CT\"]"), "Missing node _1_0");
    assert!(output.contains("_0_0 -> _1_0"), "Missing edge from _0_0");
    assert!(output.contains("_0_1 -> _1_0"), "Missing edge from _0_1");
    assert!(output.trim_end().ends_with('}'), "Missing graph footer");
}

//-----------------------------------------------------------------------------
