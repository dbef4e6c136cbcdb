//! The `perceptest summary` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use perceptest_core::model::Category;
use perceptest_core::summary::SessionSummary;
use perceptest_report::archive::load_summary;

pub fn execute(results_path: PathBuf) -> Result<()> {
    let summary = load_summary(&results_path)?;

    println!("Session:  {}", summary.session_id);
    println!(
        "Started:  {}",
        summary.session_start_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "Answered: {}/{} questions in {:.1}s",
        summary.total_questions_attempted,
        summary.total_questions_available,
        summary.total_time_ms as f64 / 1000.0
    );
    let timeouts = summary.results.iter().filter(|r| r.timed_out).count();
    if timeouts > 0 {
        println!("Timeouts: {timeouts}");
    }

    print_accuracy_table(&summary);
    Ok(())
}

/// Print the nine category accuracies in reporting order.
pub fn print_accuracy_table(summary: &SessionSummary) {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Correct", "Attempted", "Accuracy"]);

    for category in Category::ALL {
        let tally = summary.tally(category);
        table.add_row(vec![
            Cell::new(category.as_str()),
            Cell::new(tally.correct),
            Cell::new(tally.attempted),
            Cell::new(format!("{:.4}", summary.accuracy(category))),
        ]);
    }

    println!("\n{table}");
}
