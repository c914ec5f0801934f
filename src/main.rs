use std::io::{stdin, stdout, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn, Level};

use fast_word_search::activity::{ActivityLog, Event};
use fast_word_search::censor::CensoredSet;
use fast_word_search::config::Config;
use fast_word_search::repl::{self, Engine};
use fast_word_search::telemetry;
use fast_word_search::utils::plural;

#[derive(Parser, Debug)]
#[command(
    name = "fast_word_search",
    version,
    about = "Multi-threaded in-memory word search engine"
)]
struct Cli {
    /// Censored-word file (whitespace-separated tokens)
    censored_file: Option<PathBuf>,

    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (0 = number of CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// Job queue capacity
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Initial bucket count of the hash index
    #[arg(long)]
    buckets: Option<usize>,

    /// Activity log path
    #[arg(long)]
    activity_log: Option<PathBuf>,

    /// Log level for diagnostics on stderr
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else if let Some((config, path)) = Config::from_default_locations()? {
        info!(config = %path.display(), "loaded configuration");
        config
    } else {
        Config::default()
    };

    Ok(config.with_overrides(
        cli.threads,
        cli.queue_capacity,
        cli.buckets,
        cli.activity_log.clone(),
    ))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.log_level);

    let config = load_config(&cli)?;

    let censored = match &cli.censored_file {
        Some(path) => match CensoredSet::load(path) {
            Ok(set) => set,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to load censored set, continuing with none");
                CensoredSet::empty()
            }
        },
        None => CensoredSet::empty(),
    };

    let activity = match ActivityLog::open(&config.activity.path) {
        Ok(log) => log,
        Err(e) => {
            warn!(error = %e, "activity logging disabled");
            ActivityLog::disabled()
        }
    };
    activity.record(Event::CensoredLoaded(censored.len()));

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        // The handler only flips the flag; the command loop polls it and
        // performs shutdown on the main thread.
        if let Err(e) = ctrlc::set_handler(move || interrupted.store(true, Ordering::Relaxed)) {
            warn!(error = %e, "failed to install signal handler");
        }
    }

    let mut out = stdout();
    writeln!(
        out,
        "Loaded {} censored word{}.",
        censored.len(),
        plural(censored.len())
    )?;

    let mut engine = Engine::new(&config, Arc::new(censored))?;
    repl::run(&mut engine, &activity, &interrupted, stdin().lock(), &mut out)?;

    Ok(())
}
