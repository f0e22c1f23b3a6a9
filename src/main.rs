//! BIOTICA - CLI Entry Point
//!
//! Headless artificial-life simulation runner.

use biotica::{benchmark, Config, World};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "biotica")]
#[command(version)]
#[command(about = "Agent cognition and evolution engine for artificial-life simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless simulation
    Run {
        /// Configuration file (YAML)
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of ticks to simulate
        #[arg(short, long, default_value = "10000")]
        steps: u64,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Run performance benchmark
    Benchmark {
        /// Number of ticks
        #[arg(short, long, default_value = "1000")]
        steps: u64,

        /// Population size
        #[arg(short, long, default_value = "60")]
        population: usize,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            steps,
            seed,
            quiet,
        } => run_simulation(config, steps, seed, quiet),

        Commands::Benchmark { steps, population } => run_benchmark(steps, population),

        Commands::Init { output } => generate_config(output),
    }
}

fn run_simulation(
    config_path: PathBuf,
    steps: u64,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Config::from_file(&config_path)?
    } else {
        println!("Using default configuration");
        Config::default()
    };

    let mut world = match seed {
        Some(s) => {
            println!("Using seed: {}", s);
            World::new_with_seed(config.clone(), s)?
        }
        None => World::new(config.clone())?,
    };

    println!("Starting simulation");
    println!("  Initial population: {}", world.population());
    println!(
        "  World size: {}x{}",
        config.world.width, config.world.height
    );
    println!("  Steps: {}", steps);
    println!();

    let start = Instant::now();
    let stats_interval = config.logging.stats_interval;

    for i in 0..steps {
        world.step();

        if !quiet && i % stats_interval == 0 {
            println!("{}", world.stats().summary());
        }

        if world.population() == 0 {
            println!("\nPopulation extinct at tick {}", world.tick());
            break;
        }
    }

    let elapsed = start.elapsed();
    let steps_per_sec = world.tick() as f64 / elapsed.as_secs_f64();

    println!();
    println!("=== Simulation Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Ticks: {}", world.tick());
    println!("Speed: {:.1} steps/s", steps_per_sec);
    println!("Final population: {}", world.population());
    println!("Max generation: {}", world.stats().max_generation);
    println!("Food supply: {:.0}", world.food_supply());
    println!("Seed: {}", world.seed());

    Ok(())
}

fn run_benchmark(steps: u64, population: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== BIOTICA Benchmark ===");
    println!("Steps: {}", steps);
    println!("Population: {}", population);
    println!();

    let result = benchmark(steps, population)?;
    println!("{}", result);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}
