use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;
use std::{env, process};

use founder_graph_index::{BlockGraph, BuildParameters, InMemoryMsaReader, LoggingDelegate, MsaReader, PathIndex, TextMsaReader};
use founder_graph_index::{block_graph, msa, utils};
use founder_graph_index::block_graph::{BlockContentsWriter, NullTextDelegate};

use getopts::Options;
use simple_sds::serialize;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new()?;

    // Check if the index already exists.
    if utils::file_exists(&config.output) && !config.overwrite {
        return Err(format!("Index {} already exists", config.output));
    }

    // Read the segmentation and build the block graph.
    let bounds = msa::read_segmentation(&config.segmentation)?;
    if config.params.progress {
        eprintln!("Read {} block bounds from {}", bounds.len(), config.segmentation);
    }
    let graph = if config.gzip {
        read_graph(&mut InMemoryMsaReader::new(), &config, &bounds)?
    } else {
        read_graph(&mut TextMsaReader::new(), &config, &bounds)?
    };
    eprintln!(
        "The graph contains {} blocks, {} nodes, {} edges, and {} inputs",
        graph.block_count(), graph.node_count, graph.edge_count, graph.input_count
    );

    // Optional outputs.
    if config.omit_segments && config.block_contents.is_none() {
        eprintln!("Warning: --omit-segments has no effect without --block-contents");
    }
    if config.text.is_some() || config.block_contents.is_some() {
        write_text_and_contents(&graph, &config)?;
    }
    if let Some(filename) = config.graphviz.as_ref() {
        let mut writer = BufWriter::new(create_file(filename)?);
        block_graph::write_graphviz(&graph, &mut writer)?;
    }

    // Build and write the index.
    let delegate = LoggingDelegate::new(config.params.progress);
    let index = PathIndex::build(&graph, &config.params, &delegate)?;
    drop(graph);
    serialize::serialize_to(&index, &config.output).map_err(|x| x.to_string())?;
    if let Some(size) = utils::file_size(&config.output) {
        eprintln!("Index size: {}", size);
    }

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    eprintln!("Used {:.3} seconds", seconds);

    Ok(())
}

fn read_graph<R: MsaReader>(reader: &mut R, config: &Config, bounds: &[usize]) -> Result<BlockGraph, String> {
    let files = msa::add_files_from_list(reader, &config.sequences)?;
    if config.params.progress {
        eprintln!("Added {} aligned sequences from {}", files, config.sequences);
    }
    BlockGraph::read_optimized_segmentation(reader, bounds, config.params.progress)
}

fn create_file(filename: &str) -> Result<File, String> {
    File::create(filename).map_err(|x| format!("Cannot create {}: {}", filename, x))
}

// Writes the indexable text and the block contents in a single pass.
fn write_text_and_contents(graph: &BlockGraph, config: &Config) -> Result<(), String> {
    let mut text: Box<dyn Write> = match config.text.as_ref() {
        Some(filename) => Box::new(BufWriter::new(create_file(filename)?)),
        None => Box::new(io::sink()),
    };
    let len = if let Some(filename) = config.block_contents.as_ref() {
        let writer = BufWriter::new(create_file(filename)?);
        let mut delegate = BlockContentsWriter::new(graph, writer, config.omit_segments)?;
        block_graph::write_indexable_text(graph, &mut text, &mut delegate)?
    } else {
        block_graph::write_indexable_text(graph, &mut text, &mut NullTextDelegate)?
    };

    if let Some(filename) = config.text.as_ref() {
        eprintln!("Wrote {} bytes of indexable text to {}", len, filename);
    }
    if let Some(filename) = config.block_contents.as_ref() {
        eprintln!("Wrote the contents of {} blocks to {}", graph.block_count(), filename);
    }
    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub sequences: String,
    pub segmentation: String,
    pub output: String,
    pub gzip: bool,
    pub text: Option<String>,
    pub graphviz: Option<String>,
    pub block_contents: Option<String>,
    pub omit_segments: bool,
    pub overwrite: bool,
    pub params: BuildParameters,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("s", "sequences", "list of aligned sequence files, one per line (required)", "FILE");
        opts.optopt("g", "segmentation", "block right bounds (required)", "FILE");
        opts.optopt("o", "output", "output file name (required)", "FILE");
        let threads_desc = format!("number of worker threads (default {})", BuildParameters::default().threads);
        opts.optopt("t", "threads", &threads_desc, "INT");
        let chunk_desc = format!("number of blocks in a chunk (default {})", BuildParameters::DEFAULT_CHUNK_SIZE);
        opts.optopt("", "chunk-size", &chunk_desc, "INT");
        let buffer_desc = format!("maximum number of chunks in flight (default {})", BuildParameters::DEFAULT_BUFFER_COUNT);
        opts.optopt("", "buffer-count", &buffer_desc, "INT");
        opts.optflag("z", "gzip", "the sequence files may be gzip-compressed (loads them into memory)");
        opts.optopt("", "text", "write the indexable text to a file", "FILE");
        opts.optopt("", "graphviz", "write the block graph in Graphviz format", "FILE");
        opts.optopt("", "block-contents", "write the segments of each block in TSV format", "FILE");
        opts.optflag("", "omit-segments", "write segment lengths instead of segments with --block-contents");
        opts.optflag("", "overwrite", "overwrite the index file if it exists");
        opts.optflag("p", "progress", "print progress information");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] -s sequences.txt -g segmentation.txt -o index.fgi", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let mut params = BuildParameters::default();
        if let Some(s) = matches.opt_str("t") {
            params.threads = s.parse::<usize>().map_err(|x| format!("--threads: {}", x))?;
        }
        if let Some(s) = matches.opt_str("chunk-size") {
            params.chunk_size = s.parse::<usize>().map_err(|x| format!("--chunk-size: {}", x))?;
        }
        if let Some(s) = matches.opt_str("buffer-count") {
            params.buffer_count = s.parse::<usize>().map_err(|x| format!("--buffer-count: {}", x))?;
        }
        if params.threads == 0 || params.chunk_size == 0 || params.buffer_count == 0 {
            return Err(String::from("Thread count, chunk size, and buffer count must be positive"));
        }
        params.progress = matches.opt_present("p");

        let (sequences, segmentation, output) = match (matches.opt_str("s"), matches.opt_str("g"), matches.opt_str("o")) {
            (Some(sequences), Some(segmentation), Some(output)) => (sequences, segmentation, output),
            _ => {
                eprint!("{}", opts.usage(&header));
                process::exit(1);
            },
        };

        Ok(Config {
            sequences,
            segmentation,
            output,
            gzip: matches.opt_present("z"),
            text: matches.opt_str("text"),
            graphviz: matches.opt_str("graphviz"),
            block_contents: matches.opt_str("block-contents"),
            omit_segments: matches.opt_present("omit-segments"),
            overwrite: matches.opt_present("overwrite"),
            params,
        })
    }
}

//-----------------------------------------------------------------------------
