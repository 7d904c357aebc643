mod app;
mod cli;

use anyhow::{Context, Result};
use app::{App, ProxySink, UserEvent};
use clap::Parser;
use cli::{Cli, PreferenceArgs, Study};
use rand::SeedableRng;
use rand::rngs::StdRng;
use readex_experiment::{
    CsvLogWriter, PreferenceSequencer, ReadingSequencer, StudyConfig, load_pages, load_stimuli,
    presentation_order,
};
use readex_provider::{ChatProvider, ContentProvider, GenerationWorker};
use readex_render::load_font;
use readex_timing::WallClock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use winit::event_loop::EventLoop;

const DEFAULT_CONFIG: &str = "readex.toml";

fn main() {
    if let Err(error) = run() {
        eprintln!("readex error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);

    let font = load_font(&config.display.font)?;
    let event_loop = EventLoop::<UserEvent>::with_user_event()
        .build()
        .context("creating event loop")?;

    match &cli.command {
        Study::Reading(_) => {
            let sequencer = reading(&config)?;
            App::new(sequencer, config.display, font).run(event_loop)
        }
        Study::Preference(args) => {
            let sink = ProxySink::new(event_loop.create_proxy());
            let sequencer = preference(&config, args, sink)?;
            App::new(sequencer, config.display, font).run(event_loop)
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("READEX_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<StudyConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG);
            if !fallback.exists() {
                info!("no {DEFAULT_CONFIG} found, using built-in defaults");
                return Ok(StudyConfig::default());
            }
            fallback
        }
    };
    let config = StudyConfig::load(&path)?;
    info!(path = %path.display(), "study file loaded");
    Ok(config)
}

fn reading(config: &StudyConfig) -> Result<ReadingSequencer<WallClock, CsvLogWriter>> {
    let settings = &config.reading;
    let stimuli = load_stimuli(&settings.stimuli, &settings.columns)?;
    let order = match settings.seed {
        Some(seed) => presentation_order(
            stimuli.len(),
            settings.shuffle,
            &mut StdRng::seed_from_u64(seed),
        ),
        None => presentation_order(stimuli.len(), settings.shuffle, &mut rand::rng()),
    };
    info!(
        stimuli = stimuli.len(),
        shuffle = settings.shuffle,
        seed = ?settings.seed,
        "reading study ready"
    );

    let writer = CsvLogWriter::new(&config.log.dir, &config.log.reading_prefix);
    Ok(ReadingSequencer::new(
        stimuli,
        order,
        settings.instructions(),
        WallClock,
        writer,
    ))
}

fn preference(
    config: &StudyConfig,
    args: &PreferenceArgs,
    sink: ProxySink,
) -> Result<PreferenceSequencer<WallClock, CsvLogWriter, GenerationWorker>> {
    let settings = &config.preference;
    let pages = load_pages(&settings.pages)?;
    if settings.rounds.is_empty() {
        warn!("no generated rounds configured; the study ends after the fixed pages");
    }

    let provider: Arc<dyn ContentProvider> = if args.offline {
        info!("offline provider in use");
        Arc::new(settings.offline_provider())
    } else {
        let chat = config.provider.chat_settings(&settings.rounds)?;
        info!(endpoint = %chat.endpoint, model = %chat.model, "chat provider in use");
        Arc::new(ChatProvider::new(chat)?)
    };
    let worker = GenerationWorker::spawn(provider, sink).context("starting generation worker")?;
    info!(pages = pages.len(), rounds = settings.rounds.len(), "preference study ready");

    let writer = CsvLogWriter::new(&config.log.dir, &config.log.preference_prefix);
    Ok(PreferenceSequencer::new(
        pages,
        settings.round_titles(),
        settings.instructions(),
        WallClock,
        writer,
        worker,
    ))
}
