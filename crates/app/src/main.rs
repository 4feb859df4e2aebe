use std::path::PathBuf;

use beatmap_lighting_core::{
    BatchDriver, GenerationPolicy, LightingConfig, OnsetBeatTracker, TimeSourceKind,
};
use clap::{Parser, ValueEnum};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

fn main() -> beatmap_lighting_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    tracing::info!(root = ?cli.root, policy = ?config.policy, source = ?config.source, "loaded configuration");

    let rng = match cli.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut driver =
        BatchDriver::new(config, rng, OnsetBeatTracker::new())?.dry_run(cli.dry_run);
    let report = driver.run(&cli.root)?;

    print!("{}", report.summary());
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Regenerate beatmap lighting from notes or detected beats", long_about = None)]
struct Cli {
    /// Directory containing one subdirectory per song.
    root: PathBuf,

    /// JSON configuration file; flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where time points come from.
    #[arg(short, long, value_enum)]
    source: Option<SourceArg>,

    /// Rule set mapping time points to events.
    #[arg(short, long, value_enum)]
    policy: Option<PolicyArg>,

    /// Seed for reproducible output.
    #[arg(long)]
    seed: Option<u64>,

    /// Sort the final event list by time.
    #[arg(long)]
    sort: bool,

    /// Skip the atmospheric intro events.
    #[arg(long)]
    no_atmosphere: bool,

    /// Attach the clamped duration under the `clamped` policy.
    #[arg(long)]
    attach_clamped_duration: bool,

    /// Report what would change without writing any file.
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn resolve_config(&self) -> beatmap_lighting_core::Result<LightingConfig> {
        let mut config = match &self.config {
            Some(path) => LightingConfig::from_path(path)?,
            None => LightingConfig::default(),
        };

        if let Some(source) = self.source {
            config.source = source.into();
        }
        if let Some(policy) = self.policy {
            config.policy = policy.into();
        }
        if self.sort {
            config.sort_output = true;
        }
        if self.no_atmosphere {
            config.atmosphere.enabled = false;
        }
        if self.attach_clamped_duration {
            config.attach_clamped_duration = true;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    Notes,
    Beats,
}

impl From<SourceArg> for TimeSourceKind {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Notes => TimeSourceKind::Notes,
            SourceArg::Beats => TimeSourceKind::Beats,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    Simple,
    Clamped,
    Paired,
    WithDuration,
}

impl From<PolicyArg> for GenerationPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Simple => GenerationPolicy::Simple,
            PolicyArg::Clamped => GenerationPolicy::Clamped,
            PolicyArg::Paired => GenerationPolicy::Paired,
            PolicyArg::WithDuration => GenerationPolicy::WithDuration,
        }
    }
}
