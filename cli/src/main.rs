use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use engine::{paginate, process_queries, process_queries_joined, remove_duplicates};
use engine::{DocumentStatus, SearchEngine};
use serde::Deserialize;
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: i32,
    text: String,
    #[serde(default)]
    status: DocumentStatus,
    #[serde(default)]
    ratings: Vec<i32>,
}

#[derive(Parser)]
#[command(name = "search")]
#[command(about = "In-memory TF-IDF search over a JSONL corpus", long_about = None)]
struct Cli {
    /// Corpus path: a .jsonl file or a directory of .jsonl files
    #[arg(long)]
    docs: String,
    /// Whitespace-delimited stop words excluded from indexing and queries
    #[arg(long, default_value = "")]
    stop_words: String,
    /// Remove documents with duplicate word sets after loading
    #[arg(long, default_value_t = false)]
    dedup: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read queries interactively from stdin and print paged results
    Repl {
        /// Results per displayed page
        #[arg(long, default_value_t = 5)]
        page_size: usize,
    },
    /// Run queries from a file, one per line, through the batch processor
    Batch {
        /// File with one query per line
        #[arg(long)]
        queries: String,
        /// Flatten all results into one sequence
        #[arg(long, default_value_t = false)]
        joined: bool,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let mut engine = SearchEngine::from_text(&cli.stop_words)
        .context("invalid stop words")?;
    load_corpus(Path::new(&cli.docs), &mut engine)?;
    tracing::info!(documents = engine.document_count(), "corpus loaded");

    if cli.dedup {
        let removed = remove_duplicates(&mut engine);
        if !removed.is_empty() {
            println!("Removed {} duplicate document(s)", removed.len());
        }
    }

    match cli.command {
        Commands::Repl { page_size } => run_repl(&engine, page_size),
        Commands::Batch { queries, joined } => run_batch(&engine, &queries, joined),
    }
}

fn load_corpus(input: &Path, engine: &mut SearchEngine) -> Result<()> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("jsonl") {
                files.push(path.to_path_buf());
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        bail!("corpus path {} does not exist", input.display());
    }

    for file in files {
        load_jsonl(&file, engine)?;
    }
    Ok(())
}

fn load_jsonl(file: &Path, engine: &mut SearchEngine) -> Result<()> {
    let reader = BufReader::new(
        File::open(file).with_context(|| format!("cannot open {}", file.display()))?,
    );
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}", file.display(), line_number + 1))?;
        engine
            .add_document(doc.id, &doc.text, doc.status, &doc.ratings)
            .with_context(|| format!("{}:{}", file.display(), line_number + 1))?;
    }
    Ok(())
}

fn run_repl(engine: &SearchEngine, page_size: usize) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut line = String::new();
    loop {
        print!("query> ");
        stdout.flush()?;
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let query = line.trim_end();
        if query.is_empty() {
            break;
        }
        match engine.find_top_documents(query) {
            Ok(found) if found.is_empty() => println!("no matching documents"),
            Ok(found) => {
                for (number, page) in paginate(&found, page_size).enumerate() {
                    if number > 0 {
                        println!("-- page {} --", number + 1);
                    }
                    for document in page {
                        println!("{document}");
                    }
                }
            }
            Err(error) => eprintln!("query error: {error}"),
        }
    }
    Ok(())
}

fn run_batch(engine: &SearchEngine, queries_file: &str, joined: bool) -> Result<()> {
    let reader = BufReader::new(
        File::open(queries_file).with_context(|| format!("cannot open {queries_file}"))?,
    );
    let queries: Vec<String> = reader
        .lines()
        .collect::<io::Result<Vec<_>>>()?
        .into_iter()
        .filter(|query| !query.trim().is_empty())
        .collect();

    if joined {
        for document in process_queries_joined(engine, &queries)? {
            println!("{document}");
        }
    } else {
        for (query, found) in queries.iter().zip(process_queries(engine, &queries)?) {
            println!("{query}: {} result(s)", found.len());
            for document in found {
                println!("  {document}");
            }
        }
    }
    Ok(())
}
