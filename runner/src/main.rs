//! Evolves endless-runner controllers on a headless obstacle course.

mod course;

use course::Course;

use clap::Parser;
use log::{debug, info, warn};
use rexneat::logging::{EvolutionLogger, ReportingLevel};
use rexneat::{load_genome, save_genome, Population, PopulationConfig};
use rexneat_nn::controller::{decide, Controller, ACTION_COUNT, SENSOR_COUNT};
use rexneat_nn::genomics::{GeneticConfig, History, NNGenome};
use serde::{Deserialize, Serialize};

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

type RexPopulation = Population<GeneticConfig, History, NNGenome>;

/// Generations between numbered population checkpoints.
const CHECKPOINT_INTERVAL: usize = 10;

#[derive(Parser)]
#[command(name = "runner")]
#[command(version)]
#[command(about = "Evolves endless-runner controllers with NEAT")]
struct Cli {
    /// Configuration file (RON) holding the population and genetic settings
    #[arg(short, long, conflicts_with = "population")]
    config: Option<PathBuf>,

    /// Population snapshot to resume from
    #[arg(short, long, required_unless_present = "fresh")]
    population: Option<PathBuf>,

    /// Start a new population instead of resuming one
    #[arg(long, conflicts_with = "population")]
    fresh: bool,

    /// Saved genome placed in a fresh population
    #[arg(long, requires = "fresh")]
    genome: Option<PathBuf>,

    /// Number of generations to run
    #[arg(short, long, default_value = "50")]
    generations: usize,

    /// Output directory for checkpoints
    #[arg(long, default_value = "checkpoints")]
    checkpoint_dir: PathBuf,

    /// Prefix of checkpoint file names
    #[arg(short, long, default_value = "rex")]
    name: String,

    /// Random seed for reproducibility
    #[arg(short, long, conflicts_with = "population")]
    seed: Option<u64>,

    /// Maximum ticks (1/60 s) of a single run
    #[arg(short, long, default_value = "36000")]
    ticks: u64,
}

/// Contents of a `--config` file. Missing
/// sections take their default values.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct RunnerConfig {
    population: PopulationConfig,
    genetic: GeneticConfig,
}

impl RunnerConfig {
    fn load(path: &Path) -> Result<RunnerConfig, Box<dyn Error>> {
        let text = fs::read_to_string(path)
            .map_err(|e| format!("can't read config {}: {}", path.display(), e))?;
        Ok(ron::from_str(&text)?)
    }
}

/// Checks both configurations, and that genomes
/// match the controller's sensors and actions.
fn validate(population: &PopulationConfig, genetic: &GeneticConfig) -> Result<(), Box<dyn Error>> {
    population.validate()?;
    genetic.validate()?;
    let (inputs, outputs) = (genetic.input_count.get(), genetic.output_count.get());
    if inputs != SENSOR_COUNT || outputs != ACTION_COUNT {
        return Err(format!(
            "genomes need {} inputs and {} outputs, configured {} and {}",
            SENSOR_COUNT, ACTION_COUNT, inputs, outputs
        )
        .into());
    }
    Ok(())
}

/// Writes population and best-genome snapshots.
struct Checkpoints {
    dir: PathBuf,
    name: String,
}

impl Checkpoints {
    fn path(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.ron", self.name, suffix))
    }

    /// Saves the population at a generation boundary, plus a
    /// numbered copy every [`CHECKPOINT_INTERVAL`] generations.
    fn save(&self, population: &RexPopulation, best: Option<&NNGenome>) -> Result<(), Box<dyn Error>> {
        let path = self.path("population");
        population.save(&path)?;
        debug!("population saved to {}", path.display());

        if let Some(genome) = best {
            let path = self.path("genome");
            save_genome(genome, &path)?;
            debug!("best genome saved to {}", path.display());
        }

        let generation = population.generation();
        if generation > 0 && generation % CHECKPOINT_INTERVAL == 0 {
            let path = self.path(&format!("last-gen-count_{}", generation));
            population.save(&path)?;
            info!("checkpoint saved to {}", path.display());
        }
        Ok(())
    }
}

fn start(cli: &Cli, config: RunnerConfig) -> Result<RexPopulation, Box<dyn Error>> {
    if let Some(path) = &cli.population {
        let population = RexPopulation::load(path)?;
        info!(
            "resumed {} genomes from {} at generation {}",
            population.genomes().len(),
            path.display(),
            population.generation()
        );
        return Ok(population);
    }
    match &cli.genome {
        Some(path) => {
            let genome: NNGenome = load_genome(path)?;
            info!("seeding a fresh population with {}", path.display());
            RexPopulation::new_seeded(vec![genome], config.population, config.genetic)
                .ok_or_else(|| "population is too small to hold the seed genome".into())
        }
        None => Ok(RexPopulation::new(config.population, config.genetic)),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RunnerConfig::load(path)?,
        None => RunnerConfig::default(),
    };
    if cli.seed.is_some() {
        config.population.seed = cli.seed;
    }
    let mut population = start(&cli, config)?;
    validate(population.population_config(), population.genetic_config())?;
    let course_seed = population.population_config().seed.unwrap_or_else(rand::random);
    info!("course seed {}", course_seed);

    fs::create_dir_all(&cli.checkpoint_dir)?;
    let checkpoints = Checkpoints {
        dir: cli.checkpoint_dir.clone(),
        name: cli.name.clone(),
    };

    let mut controller = Controller::new(population.genetic_config().clone());
    let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    let mut best: Option<NNGenome> = None;
    let target = population.generation() + cli.generations;

    while population.generation() < target {
        let started = Instant::now();
        controller.sync(population.genomes());

        // Every genome of a generation runs the same course.
        let seed = course_seed.wrapping_add(population.generation() as u64);
        let ticks = cli.ticks;
        let networks = &controller;
        population.par_evaluate_fitness(|id, _| {
            let mut network = networks.cached(id)?.clone();
            Some(Course::run(seed, ticks, |sensors| decide(&mut network, sensors)))
        });

        logger.log(&population);
        if let Some(log) = logger.last() {
            info!(
                "generation {}: {} species, survival max {:.2}s mean {:.2}s, size mean {:.1} ({:.2?})",
                log.generation_number,
                log.species_count,
                log.fitness.maximum,
                log.fitness.mean,
                log.size.mean,
                started.elapsed()
            );
        }
        match population.champion() {
            Some((id, champion)) => {
                if best.as_ref().and_then(|b| b.fitness()) < champion.fitness() {
                    info!("new best genome {} ({} connections)", id, champion.connections().count());
                    best = Some(champion.clone());
                }
            }
            None => warn!("generation {} has no champion", population.generation()),
        }

        population.evolve()?;
        checkpoints.save(&population, best.as_ref())?;
    }

    if let Some(genome) = &best {
        info!(
            "finished at generation {}, best survival {:.2}s",
            population.generation(),
            genome.fitness().unwrap_or(0.0)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_is_valid() {
        let config: RunnerConfig = ron::from_str(include_str!("../rex.ron")).unwrap();
        validate(&config.population, &config.genetic).unwrap();
        assert_eq!(config.population.size.get(), 150);
    }

    #[test]
    fn partial_config_takes_defaults() {
        let config: RunnerConfig = ron::from_str("(population: (size: 10, compatibility_threshold: 2.0, elitism: 1, survival_threshold: 0.3, stagnation_limit: 5, asexual_reproduction_chance: 0.2, crossover_chance: 0.7, interspecies_mating_chance: 0.0, seed: None))").unwrap();
        assert_eq!(config.genetic, GeneticConfig::default());
        assert_eq!(config.population.size.get(), 10);
    }

    #[test]
    fn mismatched_controller_shape_is_rejected() {
        let genetic = GeneticConfig {
            input_count: std::num::NonZeroUsize::new(4).unwrap(),
            ..GeneticConfig::default()
        };
        assert!(validate(&PopulationConfig::default(), &genetic).is_err());
    }

    #[test]
    fn start_must_be_explicit() {
        assert!(Cli::try_parse_from(["runner"]).is_err());
        assert!(Cli::try_parse_from(["runner", "--fresh", "--population", "p.ron"]).is_err());
        assert!(Cli::try_parse_from(["runner", "--genome", "g.ron"]).is_err());

        let cli = Cli::try_parse_from(["runner", "--fresh", "--seed", "3"]).unwrap();
        assert!(cli.fresh && cli.population.is_none());
        assert_eq!(cli.seed, Some(3));
        assert_eq!(cli.generations, 50);
    }

    #[test]
    fn missing_snapshot_is_reported() {
        let cli = Cli::try_parse_from(["runner", "--population", "no/such/snapshot.ron"]).unwrap();
        let error = start(&cli, RunnerConfig::default()).err().unwrap();
        assert!(error.to_string().contains("no snapshot found"));
    }

    #[test]
    fn checkpoints_follow_naming_scheme() {
        let dir = std::env::temp_dir().join(format!("rex-checkpoints-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let checkpoints = Checkpoints {
            dir: dir.clone(),
            name: "dino".into(),
        };
        let config = PopulationConfig {
            size: std::num::NonZeroUsize::new(5).unwrap(),
            seed: Some(1),
            ..PopulationConfig::default()
        };
        let mut population = RexPopulation::new(config, GeneticConfig::default());
        for _ in 0..CHECKPOINT_INTERVAL {
            population.evaluate_fitness(|id, _| Some(id.0 as f32));
            let best = population.champion().map(|(_, g)| g.clone());
            population.evolve().unwrap();
            checkpoints.save(&population, best.as_ref()).unwrap();
        }

        assert!(dir.join("dino_population.ron").exists());
        assert!(dir.join("dino_genome.ron").exists());
        assert!(dir.join("dino_last-gen-count_10.ron").exists());
        assert!(!dir.join("dino_last-gen-count_5.ron").exists());
        let restored = RexPopulation::load(dir.join("dino_last-gen-count_10.ron")).unwrap();
        assert_eq!(restored.genomes(), population.genomes());
        fs::remove_dir_all(&dir).unwrap();
    }
}
