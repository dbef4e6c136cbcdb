//! The `perceptest run` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use perceptest_core::config::load_config_from;
use perceptest_core::corpus::{load_bank, CorpusFormat};
use perceptest_core::engine::{SessionEngine, SessionEngineConfig};
use perceptest_core::results::ResultRecord;
use perceptest_core::session::QuestionView;
use perceptest_core::summary::SessionSummary;
use perceptest_core::traits::{AnswerSource, SessionObserver, SilentCue, TransitionCue};
use perceptest_report::archive::{export_session, write_fallback_json, ExportOutcome};

use super::summary::print_accuracy_table;

pub struct RunArgs {
    pub corpus: Option<PathBuf>,
    pub format: Option<CorpusFormat>,
    pub time_limit: Option<u32>,
    pub output: Option<PathBuf>,
    pub image_dir: Option<String>,
    pub no_cue: bool,
    pub feedback: bool,
    pub config: Option<PathBuf>,
}

/// Prints questions to the terminal. Correctness is only shown with `feedback`.
struct ConsoleObserver {
    feedback: bool,
}

impl SessionObserver for ConsoleObserver {
    fn on_question_ready(&self, question: &QuestionView) {
        println!();
        println!(
            "Question {}/{}  [{}]",
            question.index + 1,
            question.total,
            question.image_path
        );
        println!("  {}", question.question_text);
        for (i, answer) in question.answers.iter().enumerate() {
            println!("    {}) {answer}", option_letter(i));
        }
        println!("  ({}s)", question.time_limit_secs);
    }

    fn on_countdown(&self, _index: usize, remaining_secs: u32) {
        if remaining_secs > 0 && remaining_secs <= 3 {
            eprintln!("  {remaining_secs}s left");
        }
    }

    fn on_result_recorded(&self, record: &ResultRecord) {
        if !self.feedback {
            if record.timed_out {
                println!("  Time's up.");
            }
            return;
        }
        if record.timed_out {
            println!("  Time's up. Answer: {}", record.correct_answer);
        } else if record.is_correct {
            println!("  Correct ({}ms)", record.time_taken_ms);
        } else {
            println!(
                "  Wrong ({}ms). Answer: {}",
                record.time_taken_ms, record.correct_answer
            );
        }
    }

    fn on_session_complete(&self, summary: &SessionSummary) {
        println!(
            "\nSession complete: {} questions in {:.1}s",
            summary.total_questions_attempted,
            summary.total_time_ms as f64 / 1000.0
        );
    }
}

/// Reads answers line by line from stdin.
///
/// A line is either an option letter or the exact answer text. Lines are
/// read on a dedicated thread so a pending read never holds up shutdown.
struct StdinAnswers {
    lines: mpsc::UnboundedReceiver<String>,
}

impl StdinAnswers {
    fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || forward_lines(std::io::stdin().lock(), &tx));
        Self { lines: rx }
    }
}

/// Send each input line to `tx` until EOF, a read error, or a closed channel.
///
/// Bytes that are not valid UTF-8 are replaced rather than ending the input.
fn forward_lines<R: BufRead>(mut reader: R, tx: &mpsc::UnboundedSender<String>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']);
                if tx.send(line.to_string()).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("failed to read answer: {e}");
                break;
            }
        }
    }
}

#[async_trait]
impl AnswerSource for StdinAnswers {
    async fn next_answer(&mut self, question: &QuestionView) -> Option<String> {
        // `recv` is cancel-safe, so a countdown tick never loses input.
        while let Some(line) = self.lines.recv().await {
            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            match resolve_answer(input, &question.answers) {
                Some(answer) => return Some(answer),
                None => eprintln!("  '{input}' is not one of the options"),
            }
        }
        None
    }
}

/// Rings the terminal bell.
struct BellCue;

impl TransitionCue for BellCue {
    fn play(&self) -> Result<()> {
        let mut out = std::io::stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

fn option_letter(i: usize) -> char {
    (b'a' + i as u8) as char
}

/// Map typed input to one of the visible answers.
///
/// Exact answer text wins over option letters.
fn resolve_answer(input: &str, answers: &[String]) -> Option<String> {
    if let Some(answer) = answers.iter().find(|a| a.as_str() == input) {
        return Some(answer.clone());
    }
    let mut chars = input.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => {
            let index = (c as u8 - b'a') as usize;
            answers.get(index).cloned()
        }
        _ => None,
    }
}

pub async fn execute(args: RunArgs) -> Result<()> {
    let config = load_config_from(args.config.as_deref())?;

    let corpus = args.corpus.or(config.corpus).ok_or_else(|| {
        anyhow::anyhow!("no corpus given; pass --corpus or set `corpus` in perceptest.toml")
    })?;
    let format = args.format.or(config.format);
    let image_dir = args.image_dir.unwrap_or(config.image_dir);
    let output = args.output.unwrap_or(config.output_dir);
    let time_limit = match args.time_limit.unwrap_or(config.time_limit_secs) {
        0 => {
            eprintln!("Warning: time limit of 0s raised to 1s");
            1
        }
        secs => secs,
    };
    let cue_enabled = config.cue && !args.no_cue;

    let (bank, skipped) = load_bank(&corpus, format, &image_dir)?;
    if !skipped.is_empty() {
        eprintln!("Warning: {} invalid corpus entries skipped", skipped.len());
    }

    println!(
        "perceptest v{}: {} questions, {}s per question",
        env!("CARGO_PKG_VERSION"),
        bank.len(),
        time_limit
    );
    println!("Example image: {}", bank.example_image());
    println!("Type the option letter or the answer text, then press Enter.");

    let engine = SessionEngine::new(SessionEngineConfig {
        time_limit_secs: time_limit,
        ..Default::default()
    });

    let mut answers = StdinAnswers::spawn();
    let cue: Box<dyn TransitionCue> = if cue_enabled {
        Box::new(BellCue)
    } else {
        Box::new(SilentCue)
    };

    let observer = ConsoleObserver {
        feedback: args.feedback,
    };

    let summary = engine
        .run(Arc::new(bank), &mut answers, &observer, cue.as_ref())
        .await?;

    print_accuracy_table(&summary);

    match export_session(&summary, &output).await {
        ExportOutcome::Written(path) => {
            println!("Results saved to: {}", path.display());
        }
        ExportOutcome::ChartFailed(e) | ExportOutcome::ArchiveFailed(e) => {
            eprintln!("Warning: could not write results archive: {e}");
            let path = write_fallback_json(&summary, &output)?;
            println!("Results saved to: {}", path.display());
        }
    }

    Ok(())
}
