use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;
use std::{env, fs};

use rayon::prelude::*;
use topic_vectorizer::corpus::token::{sentence_lemmas, Tokenizer};
use topic_vectorizer::corpus::{TaggedTextTokenizer, TupleDocument, VecCorpus};
use topic_vectorizer::{LemmaInput, Model, ModelConfig, Result, TopicError, TrainOptions};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Train,
    Query,
    Similar,
}

#[derive(Debug)]
struct Args {
    command: Command,
    name: Option<String>,
    dir: Option<PathBuf>,
    docs: Option<PathBuf>,
    dimensions: Option<usize>,
    min_count: Option<u64>,
    max_ratio: Option<f64>,
    keep_temp: bool,
    index: bool,
    top: Option<usize>,
    lemmas: Vec<String>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  topic-vectorizer train --docs DIR --name NAME [--dir DIR] [--dimensions N]");
    eprintln!("                         [--min-count N] [--max-ratio F] [--keep-temp] [--index]");
    eprintln!("  topic-vectorizer query --name NAME [--dir DIR] LEMMA/CAT...");
    eprintln!("  topic-vectorizer similar --name NAME [--dir DIR] [--docs DIR] [--top N] LEMMA/CAT...");
    eprintln!("Documents are tagged text files, one token per line: surface tag lemma.");
    eprintln!("Log level is taken from RUST_LOG (default: info).");
}

fn invalid(msg: impl Into<String>) -> TopicError {
    TopicError::InvalidConfig(msg.into())
}

fn value<T: std::str::FromStr>(flag: &str, v: Option<String>) -> Result<T> {
    let v = v.ok_or_else(|| invalid(format!("{} requires a value", flag)))?;
    v.parse::<T>().map_err(|_| invalid(format!("{} got an unusable value {:?}", flag, v)))
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Args>> {
    let command = match args.next().as_deref() {
        Some("train") => Command::Train,
        Some("query") => Command::Query,
        Some("similar") => Command::Similar,
        Some("-h") | Some("--help") | None => return Ok(None),
        Some(other) => return Err(invalid(format!("unknown command {:?}", other))),
    };
    let mut parsed = Args {
        command,
        name: None,
        dir: None,
        docs: None,
        dimensions: None,
        min_count: None,
        max_ratio: None,
        keep_temp: false,
        index: false,
        top: None,
        lemmas: Vec::new(),
    };
    while let Some(a) = args.next() {
        match a.as_str() {
            "--name" => parsed.name = Some(value("--name", args.next())?),
            "--dir" => parsed.dir = Some(value::<PathBuf>("--dir", args.next())?),
            "--docs" => parsed.docs = Some(value::<PathBuf>("--docs", args.next())?),
            "--dimensions" => parsed.dimensions = Some(value("--dimensions", args.next())?),
            "--min-count" => parsed.min_count = Some(value("--min-count", args.next())?),
            "--max-ratio" => parsed.max_ratio = Some(value("--max-ratio", args.next())?),
            "--top" => parsed.top = Some(value("--top", args.next())?),
            "--keep-temp" => parsed.keep_temp = true,
            "--index" => parsed.index = true,
            "-h" | "--help" => return Ok(None),
            flag if flag.starts_with("--") => return Err(invalid(format!("unknown option {}", flag))),
            lemma => parsed.lemmas.push(lemma.to_string()),
        }
    }
    Ok(Some(parsed))
}

fn open_model(args: &Args) -> Result<Model> {
    let name = args.name.clone().ok_or_else(|| invalid("--name is required"))?;
    let mut config = ModelConfig::new(name);
    if let Some(dir) = &args.dir {
        config = config.with_directory(dir);
    }
    if let Some(dimensions) = args.dimensions {
        config = config.with_dimensions(dimensions);
    }
    Model::with_config(config)
}

/// Tagged files of a directory, sorted by path
fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Read and lemmatize every file in parallel
/// An unreadable file becomes an empty document so numbering stays aligned with the listing
fn load_documents(files: &[PathBuf]) -> Vec<TupleDocument> {
    let tokenizer = TaggedTextTokenizer::new();
    files
        .par_iter()
        .map(|path| match fs::read_to_string(path) {
            Ok(text) => tokenizer
                .tokenize(&text)
                .iter()
                .flat_map(|sentence| sentence_lemmas(sentence))
                .collect(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "document skipped");
                TupleDocument::default()
            }
        })
        .collect()
}

fn lemma_inputs(args: &Args) -> Result<Vec<LemmaInput>> {
    if args.lemmas.is_empty() {
        return Err(invalid("at least one LEMMA/CAT is required"));
    }
    Ok(args.lemmas.iter().map(|l| LemmaInput::key(l.as_str())).collect())
}

fn train(args: &Args) -> Result<()> {
    let docs_dir = args.docs.as_ref().ok_or_else(|| invalid("--docs is required"))?;
    let mut model = open_model(args)?;
    let mut options = TrainOptions::default().keep_temp_files(args.keep_temp);
    if let Some(min_count) = args.min_count {
        options = options.with_min_count(min_count);
    }
    if let Some(max_ratio) = args.max_ratio {
        options = options.with_max_ratio(max_ratio);
    }

    let load_start = Instant::now();
    let files = list_documents(docs_dir)?;
    if files.is_empty() {
        return Err(invalid(format!("no files found in {}", docs_dir.display())));
    }
    let corpus: VecCorpus<TupleDocument> = load_documents(&files).into_iter().collect();
    info!(
        files = files.len(),
        threads = rayon::current_num_threads(),
        elapsed_ms = load_start.elapsed().as_millis() as u64,
        "documents loaded"
    );

    if args.index {
        model.train_similarity(&corpus, &options)?;
    } else {
        model.train(&corpus, &options)?;
    }
    if let (Some(dictionary), Some(lsi)) = (model.dictionary(), model.lsi_model()) {
        println!("terms\t{}", dictionary.len());
        println!("topics\t{}", lsi.num_components());
        for topic in 0..lsi.num_components().min(5) {
            let terms: Vec<String> = lsi
                .top_terms(topic, 8, dictionary)
                .into_iter()
                .map(|(key, w)| format!("{:.3}*{}", w, key))
                .collect();
            println!("topic {}\t{}", topic, terms.join(" + "));
        }
    }
    Ok(())
}

fn query(args: &Args) -> Result<()> {
    let lemmas = lemma_inputs(args)?;
    let mut model = open_model(args)?;
    let vector = model.topic_vector(&lemmas)?;
    if vector.is_empty() {
        warn!("no known lemmas in query");
    }
    println!("{:.6}", vector);
    Ok(())
}

fn similar(args: &Args) -> Result<()> {
    let lemmas = lemma_inputs(args)?;
    let mut model = open_model(args)?;
    let vector = model.topic_vector(&lemmas)?;
    let hits = model.nearest_neighbors(&vector, Some(args.top.unwrap_or(10)))?;
    let names = match &args.docs {
        Some(dir) => list_documents(dir)?,
        None => Vec::new(),
    };
    for (doc, score) in &hits.list {
        match names.get(*doc).and_then(|p| p.file_name()) {
            Some(name) => println!("{:.6}\t{}", score, name.to_string_lossy()),
            None => println!("{:.6}\t{}", score, doc),
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("[error] {}", e);
            print_usage();
            return ExitCode::from(2);
        }
    };

    let program_start = Instant::now();
    let res = match args.command {
        Command::Train => train(&args),
        Command::Query => query(&args),
        Command::Similar => similar(&args),
    };
    info!(elapsed_ms = program_start.elapsed().as_millis() as u64, "done");
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[error] {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Option<Args>> {
        parse_args(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_train_flags() {
        let a = args(&["train", "--docs", "d", "--name", "n", "--dimensions", "50", "--min-count", "0", "--keep-temp"])
            .unwrap()
            .unwrap();
        assert_eq!(a.command, Command::Train);
        assert_eq!(a.docs, Some(PathBuf::from("d")));
        assert_eq!(a.dimensions, Some(50));
        assert_eq!(a.min_count, Some(0));
        assert!(a.keep_temp);
        assert!(!a.index);
    }

    #[test]
    fn positional_arguments_are_lemmas() {
        let a = args(&["query", "--name", "n", "maður/kk", "búð/kvk"]).unwrap().unwrap();
        assert_eq!(a.lemmas, vec!["maður/kk", "búð/kvk"]);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(args(&["frobnicate"]).is_err());
        assert!(args(&["train", "--dimensions", "many"]).is_err());
        assert!(args(&["train", "--name"]).is_err());
        assert!(args(&["query", "--bogus"]).is_err());
        assert!(args(&[]).unwrap().is_none());
    }
}
