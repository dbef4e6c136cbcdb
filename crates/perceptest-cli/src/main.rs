//! perceptest CLI: run timed perception sessions and inspect their results.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use perceptest_core::corpus::CorpusFormat;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "perceptest",
    version,
    about = "Timed visual-perception question harness"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a question session in the terminal
    Run {
        /// Corpus file (JSON or tab-delimited)
        #[arg(long)]
        corpus: Option<PathBuf>,

        /// Corpus format: json or tsv (default: detect from extension)
        #[arg(long)]
        format: Option<CorpusFormat>,

        /// Seconds allowed per question
        #[arg(long)]
        time_limit: Option<u32>,

        /// Output directory for the results archive
        #[arg(long)]
        output: Option<PathBuf>,

        /// Directory prefixed to image names in JSON corpora
        #[arg(long)]
        image_dir: Option<String>,

        /// Do not ring the terminal bell between questions
        #[arg(long)]
        no_cue: bool,

        /// Show whether each answer was correct during the session
        #[arg(long)]
        feedback: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a corpus file and report what would be loaded
    Validate {
        /// Corpus file (JSON or tab-delimited)
        #[arg(long)]
        corpus: PathBuf,

        /// Corpus format: json or tsv (default: detect from extension)
        #[arg(long)]
        format: Option<CorpusFormat>,
    },

    /// Print the accuracy table of a finished session
    Summary {
        /// results.json or a results archive (.zip)
        #[arg(long)]
        results: PathBuf,
    },

    /// Create starter config and example corpus
    Init,
}

#[tokio::main]
async fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("perceptest=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            corpus,
            format,
            time_limit,
            output,
            image_dir,
            no_cue,
            feedback,
            config,
        } => {
            commands::run::execute(commands::run::RunArgs {
                corpus,
                format,
                time_limit,
                output,
                image_dir,
                no_cue,
                feedback,
                config,
            })
            .await
        }
        Commands::Validate { corpus, format } => commands::validate::execute(corpus, format),
        Commands::Summary { results } => commands::summary::execute(results),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
