//! The `perceptest validate` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};

use perceptest_core::corpus::{load_corpus, CorpusFormat, DEFAULT_IMAGE_DIR};

pub fn execute(corpus_path: PathBuf, format: Option<CorpusFormat>) -> Result<()> {
    let loaded = load_corpus(&corpus_path, format, DEFAULT_IMAGE_DIR)?;

    for skipped in &loaded.skipped {
        println!("  [{}] WARNING: {}", skipped.location, skipped.reason);
    }
    let skipped_count = loaded.skipped.len();

    let bank = loaded
        .into_bank()
        .with_context(|| format!("no usable questions in {}", corpus_path.display()))?;

    println!(
        "Corpus: {} ({} questions, {} relational)",
        corpus_path.display(),
        bank.len(),
        bank.relational_count()
    );

    let mut table = Table::new();
    table.set_header(vec!["Subtype", "Questions"]);
    for (subtype, count) in bank.subtype_counts() {
        let name = subtype.map(|s| s.as_str()).unwrap_or("(none)");
        table.add_row(vec![Cell::new(name), Cell::new(count)]);
    }
    println!("{table}");

    if skipped_count == 0 {
        println!("Corpus valid.");
    } else {
        println!("\n{skipped_count} entry(ies) skipped.");
    }

    Ok(())
}
