use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;
use std::{env, process};

use founder_graph_index::{BlockGraph, Block, InMemoryMsaReader, MsaReader, TextMsaReader};
use founder_graph_index::{block_graph, msa};

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new()?;

    // Build the graph.
    let bounds = msa::read_segmentation(&config.segmentation)?;
    let graph = if config.gzip {
        read_graph(&mut InMemoryMsaReader::new(), &config, &bounds)?
    } else {
        read_graph(&mut TextMsaReader::new(), &config, &bounds)?
    };

    // Summary and block details.
    let mut output = BufWriter::new(io::stdout().lock());
    write_summary(&mut output, &graph).map_err(|x| x.to_string())?;
    let blocks: Vec<usize> = if config.all_blocks { (0..graph.block_count()).collect() } else { config.blocks.clone() };
    for block_idx in blocks {
        if block_idx >= graph.block_count() {
            return Err(format!("Block {} does not exist; the graph has {} blocks", block_idx, graph.block_count()));
        }
        write_block(&mut output, block_idx, &graph.blocks[block_idx]).map_err(|x| x.to_string())?;
    }
    output.flush().map_err(|x| x.to_string())?;

    if let Some(filename) = config.graphviz.as_ref() {
        let mut writer = BufWriter::new(File::create(filename).map_err(|x| format!("Cannot create {}: {}", filename, x))?);
        block_graph::write_graphviz(&graph, &mut writer)?;
    }

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

fn read_graph<R: MsaReader>(reader: &mut R, config: &Config, bounds: &[usize]) -> Result<BlockGraph, String> {
    msa::add_files_from_list(reader, &config.sequences)?;
    BlockGraph::read_optimized_segmentation(reader, bounds, false)
}

//-----------------------------------------------------------------------------

fn write_summary<W: Write>(output: &mut W, graph: &BlockGraph) -> io::Result<()> {
    writeln!(output, "Blocks: {}", graph.block_count())?;
    writeln!(output, "Nodes: {}", graph.node_count)?;
    writeln!(output, "Edges: {}", graph.edge_count)?;
    writeln!(output, "Total node label length: {}", graph.node_label_length_sum)?;
    writeln!(output, "Maximum node label length: {}", graph.node_label_max_length)?;
    writeln!(output, "Aligned size: {}", graph.aligned_size)?;
    writeln!(output, "Inputs: {}", graph.input_count)?;
    writeln!(output, "Maximum block height: {}", graph.max_block_height)?;
    Ok(())
}

fn write_block<W: Write>(output: &mut W, block_idx: usize, block: &Block) -> io::Result<()> {
    writeln!(output)?;
    writeln!(output, "Block {}", block_idx)?;
    writeln!(output, "Aligned position: {}", block.aligned_position)?;
    writeln!(output, "Nodes before: {}", block.node_csum)?;
    writeln!(output, "Label length before: {}", block.node_label_length_csum)?;
    if !block.reverse_in_edges.is_empty() {
        writeln!(output, "In-edges:")?;
        for &(rhs, lhs) in block.reverse_in_edges.iter() {
            writeln!(output, "\t{} -> {}", lhs, rhs)?;
        }
    }
    writeln!(output, "Segments:")?;
    for (rank, segment) in block.segments.iter().enumerate() {
        let inputs: Vec<String> = block.inputs[rank].iter().map(|x| x.to_string()).collect();
        writeln!(output, "\t{}\t({}) {}\t{}", rank, segment.len(), String::from_utf8_lossy(segment), inputs.join(","))?;
    }
    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub sequences: String,
    pub segmentation: String,
    pub gzip: bool,
    pub blocks: Vec<usize>,
    pub all_blocks: bool,
    pub graphviz: Option<String>,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("s", "sequences", "list of aligned sequence files, one per line (required)", "FILE");
        opts.optopt("g", "segmentation", "block right bounds (required)", "FILE");
        opts.optflag("z", "gzip", "the sequence files may be gzip-compressed (loads them into memory)");
        opts.optmulti("b", "block", "print the details of block N (may repeat)", "N");
        opts.optflag("a", "all", "print the details of all blocks");
        opts.optopt("", "graphviz", "write the block graph in Graphviz format", "FILE");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] -s sequences.txt -g segmentation.txt", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let mut blocks = Vec::new();
        for s in matches.opt_strs("b") {
            let block = s.parse::<usize>().map_err(|x| format!("--block {}: {}", s, x))?;
            blocks.push(block);
        }

        let (sequences, segmentation) = match (matches.opt_str("s"), matches.opt_str("g")) {
            (Some(sequences), Some(segmentation)) => (sequences, segmentation),
            _ => {
                eprint!("{}", opts.usage(&header));
                process::exit(1);
            },
        };

        Ok(Config {
            sequences,
            segmentation,
            gzip: matches.opt_present("z"),
            blocks,
            all_blocks: matches.opt_present("a"),
            graphviz: matches.opt_str("graphviz"),
        })
    }
}

//-----------------------------------------------------------------------------
