use std::io::{self, BufRead, BufWriter, Write};
use std::time::Instant;
use std::{env, process};

use founder_graph_index::{PathIndex, QueryResult, utils};

use getopts::Options;
use simple_sds::serialize;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new()?;

    // Load the index.
    let index: PathIndex = serialize::load_from(&config.index).map_err(|x| format!("Cannot load {}: {}", config.index, x))?;
    if config.verbose {
        eprintln!(
            "Loaded an index with {} blocks, {} nodes, {} edges, and {} inputs",
            index.block_count(), index.node_count(), index.edge_count(), index.input_count()
        );
    }

    // Run the queries.
    let reader: Box<dyn BufRead> = match config.patterns.as_ref() {
        Some(filename) => utils::open_file(filename)?,
        None => Box::new(io::stdin().lock()),
    };
    let mut output = BufWriter::new(io::stdout().lock());
    writeln!(output, "{}", QueryResult::REPORT_HEADER).map_err(|x| x.to_string())?;
    let use_prompt = config.patterns.is_none() && !config.without_prompt;
    let mut lines = reader.lines();
    let mut queries = 0;
    loop {
        if use_prompt {
            eprint!("Pattern? ");
            io::stderr().flush().map_err(|x| x.to_string())?;
        }
        let line = match lines.next() {
            Some(line) => line.map_err(|x| x.to_string())?,
            None => break,
        };
        for pattern in line.split_whitespace() {
            let query_start = Instant::now();
            let result = index.list_occurrences(pattern.as_bytes());
            let micros = query_start.elapsed().as_secs_f64() * 1e6;
            result.write_report_row(&mut output, pattern, micros).map_err(|x| x.to_string())?;
            queries += 1;
        }
        if use_prompt {
            output.flush().map_err(|x| x.to_string())?;
        }
    }
    output.flush().map_err(|x| x.to_string())?;

    if config.verbose {
        let end_time = Instant::now();
        let seconds = end_time.duration_since(start_time).as_secs_f64();
        eprintln!("Ran {} queries", queries);
        eprintln!("Used {:.3} seconds", seconds);
    }

    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub index: String,
    pub patterns: Option<String>,
    pub without_prompt: bool,
    pub verbose: bool,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optflag("", "without-prompt", "do not prompt for patterns when reading from stdin");
        opts.optflag("v", "verbose", "print statistics to stderr");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        let header = format!("Usage: {} [options] index.fgi [patterns.txt]\n\nPatterns are separated by whitespace. Reads the patterns from stdin if no pattern file is given.", program);
        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }

        let index = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        Ok(Config {
            index,
            patterns: matches.free.get(1).cloned(),
            without_prompt: matches.opt_present("without-prompt"),
            verbose: matches.opt_present("v"),
        })
    }
}

//-----------------------------------------------------------------------------
