use clap::{Args, Parser, Subcommand};
use readex_experiment::StudyConfig;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "readex", version, about = "Paragraph reading and preference studies")]
pub struct Cli {
    /// Study file; `readex.toml` is used when present, defaults otherwise
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for participant logs
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Study,
}

#[derive(Debug, Subcommand)]
pub enum Study {
    /// Read paragraphs and answer one question after each
    Reading(ReadingArgs),
    /// Choose between paragraph pairs, then read generated ones
    Preference(PreferenceArgs),
}

#[derive(Debug, Args)]
pub struct ReadingArgs {
    /// Stimulus CSV
    #[arg(long)]
    pub stimuli: Option<PathBuf>,

    /// Present stimuli in file order
    #[arg(long)]
    pub no_shuffle: bool,

    /// Seed for the presentation order
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug, Args)]
pub struct PreferenceArgs {
    /// Fixed pair pages CSV
    #[arg(long)]
    pub pages: Option<PathBuf>,

    /// Use the configured canned passages instead of the chat endpoint
    #[arg(long)]
    pub offline: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the study file.
    pub fn apply(&self, config: &mut StudyConfig) {
        if let Some(dir) = &self.log_dir {
            config.log.dir = dir.clone();
        }
        match &self.command {
            Study::Reading(args) => {
                if let Some(path) = &args.stimuli {
                    config.reading.stimuli = path.clone();
                }
                if args.no_shuffle {
                    config.reading.shuffle = false;
                }
                if args.seed.is_some() {
                    config.reading.seed = args.seed;
                }
            }
            Study::Preference(args) => {
                if let Some(path) = &args.pages {
                    config.preference.pages = path.clone();
                }
            }
        }
    }
}
