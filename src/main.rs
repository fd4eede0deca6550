use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use digital_twin::config::{self, Config, GenerationMode};
use digital_twin::parsing::{read_table, SurveyColumns, UniverseColumns};
use digital_twin::population_io::save_population_snapshot;
use digital_twin::DigitalTwinEngine;

#[derive(Parser, Debug)]
#[command(name = "digital_twin", about = "Expands a survey sample into a synthetic population")]
struct Cli {
    /// TOML configuration (columns, rules, thresholds). Built-in defaults otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Survey sample (delimited text).
    #[arg(long)]
    sample: PathBuf,

    /// Census table with group labels and head counts. Required in census mode.
    #[arg(long)]
    universe: Option<PathBuf>,

    #[arg(long, value_enum)]
    mode: Option<GenerationMode>,

    /// Target universe size for augment mode.
    #[arg(long)]
    total: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,

    /// Where to write the JSON population snapshot.
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => config::load_config_from_file(path)?,
        None => Config::default(),
    };

    let sample = read_table(&cli.sample)
        .with_context(|| format!("loading survey sample {}", cli.sample.display()))?;
    let mut engine = DigitalTwinEngine::new(config.rule_table());
    engine.fit(&sample, &SurveyColumns::from(&config.columns))?;

    let seed = cli.seed.or(config.generation.seed);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mode = cli.mode.unwrap_or(config.generation.mode);
    let population = match mode {
        GenerationMode::Census => {
            let Some(path) = &cli.universe else {
                bail!("census mode needs --universe");
            };
            let universe = read_table(path)
                .with_context(|| format!("loading universe {}", path.display()))?;
            engine.generate(&universe, &UniverseColumns::from(&config.columns), &mut rng)?
        }
        GenerationMode::Augment => {
            let Some(total) = cli.total.or(config.generation.total_universe) else {
                bail!("augment mode needs --total or generation.total_universe");
            };
            engine.augment(total, &mut rng)?
        }
    };

    let model = engine.model()?;
    println!("Sample\n{}", model.sample_crosstab().render());
    println!("Synthetic population");
    let crosstab = population.crosstab(model.vocabulary());
    println!("{}", crosstab.render());
    info!(
        individuals = population.len(),
        skipped = population.stats.groups_skipped,
        ambiguous = population.stats.ambiguous_matches,
        "Run complete"
    );

    if let Some(path) = &cli.output {
        save_population_snapshot(&population, &crosstab, path)?;
        info!("Snapshot written to {}", path.display());
    }
    Ok(())
}
