use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use indexer::{artifacts::IndexPaths, query, BuildConfig, Error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "indexer", about = "An external-memory inverted-index builder and query tool", author, version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from a directory of crawled document records.
    Build {
        #[arg(long, default_value = "DEV")]
        input: PathBuf,
        #[arg(long, default_value = "INDEX")]
        output: PathBuf,
        #[arg(long, default_value_t = 30_000)]
        token_limit: usize,
    },
    /// Run a single query against an already-built index.
    Query {
        #[arg(long, default_value = "INDEX")]
        index: PathBuf,
        #[arg(long, default_value_t = query::DEFAULT_RESULT_LIMIT)]
        limit: usize,
        query: String,
    },
    /// Build the index, print statistics, then enter the interactive
    /// search interface. This is also what runs when no subcommand is
    /// given, mirroring a single process that runs build-then-query.
    Run {
        #[arg(long, default_value = "DEV")]
        input: PathBuf,
        #[arg(long, default_value = "INDEX")]
        output: PathBuf,
        #[arg(long, default_value_t = 30_000)]
        token_limit: usize,
        #[arg(long, default_value_t = query::DEFAULT_RESULT_LIMIT)]
        limit: usize,
    },
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        input: PathBuf::from(indexer::DEFAULT_INPUT_DIR),
        output: PathBuf::from("INDEX"),
        token_limit: 30_000,
        limit: query::DEFAULT_RESULT_LIMIT,
    });

    match command {
        Commands::Build { input, output, token_limit } => run_build(&input, &output, token_limit).map(|_| ()),
        Commands::Query { index, limit, query } => run_query(&index, &query, limit),
        Commands::Run { input, output, token_limit, limit } => run_build_then_search(&input, &output, token_limit, limit),
    }
}

fn run_build(input: &Path, output: &Path, token_limit: usize) -> Result<IndexPaths, Error> {
    let config = BuildConfig {
        token_limit,
        output_dir: output.to_path_buf(),
        parallel_extraction: true,
    };

    let result = indexer::build(input, &config)?;
    println!("{}", result.stats);
    tracing::info!(
        indexed_documents = result.stats.indexed_documents,
        unique_terms = result.stats.unique_terms,
        partial_run_count = result.stats.partial_run_count,
        "build complete"
    );
    Ok(result.paths)
}

fn run_query(index: &Path, query_str: &str, limit: usize) -> Result<(), Error> {
    let paths = IndexPaths::new(index.to_path_buf());
    let urls = indexer::query(query_str, &paths, limit)?;
    print_results(&urls);
    Ok(())
}

fn run_build_then_search(input: &Path, output: &Path, token_limit: usize, limit: usize) -> Result<(), Error> {
    let paths = run_build(input, output, token_limit)?;
    search_interface(&paths, limit)
}

/// Reads queries from stdin until the sentinel `exit` is entered, printing
/// the matching URLs (or a "no results" message) for each.
fn search_interface(paths: &IndexPaths, limit: usize) -> Result<(), Error> {
    println!("\n--------SEARCH INTERFACE--------\n");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("\nEnter your query (type 'exit' to quit): ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let query_str = line.trim();
        if query_str.eq_ignore_ascii_case("exit") {
            break;
        }

        let urls = indexer::query(query_str, paths, limit)?;
        print_results(&urls);
    }

    println!("----------------------------------");
    Ok(())
}

fn print_results(urls: &[String]) {
    if urls.is_empty() {
        println!("No relevant documents found");
    } else {
        for url in urls {
            println!("{url}");
        }
    }
}
