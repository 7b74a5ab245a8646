pub mod cli;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use anyhow::Context;
use log::info;
use model::Vocabulary;
use std::io::Read;

pub fn run(args: &cli::Cli) -> anyhow::Result<()> {
    let vocabulary = match &args.vocabulary {
        Some(path) => Vocabulary::load(path)?,
        None => Vocabulary::default(),
    };

    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .with_context(|| "Reading scene script from stdin")?;
    info!("read {} bytes, cutting at line {}", source.len(), args.line);

    let sliced = slice(&source, args.line, &vocabulary)?;

    // 3. ── Write output ───────────────────────────────────────────────
    writer::python::emit(sliced, &args.output)
        .with_context(|| format!("Writing {}", args.output.display()))?;

    Ok(())
}

/// Parse and process one script, ready for a writer.
pub fn slice(source: &str, line: usize, vocabulary: &Vocabulary) -> anyhow::Result<model::SlicedScript> {
    // 1. ── Parse ──────────────────────────────────────────────────────
    let module = parser::parse_script(source).with_context(|| "Parsing scene script")?;

    // 2. ── Process ────────────────────────────────────────────────────
    processor::run(module, line, vocabulary).with_context(|| "Rewriting scene script")
}

/// Whole pipeline on in-memory text.
pub fn slice_to_string(source: &str, line: usize, vocabulary: &Vocabulary) -> anyhow::Result<String> {
    let sliced = slice(source, line, vocabulary)?;
    writer::python::render(sliced).with_context(|| "Emitting scene script")
}
