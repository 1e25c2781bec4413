//! Headless cloud chamber runner.
//!
//! Runs a chamber for a fixed number of frames and writes the trail image
//! as a PNG.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use cloudchamber::time::FrameClock;
use cloudchamber::{Backend, ChamberConfig, IsotopeCatalog, Simulation, View};

#[derive(Parser)]
#[command(name = "cloudchamber")]
#[command(about = "Simulate a diffusion cloud chamber and render its trails", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON configuration file; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Isotope to emit
    #[arg(short, long)]
    isotope: Option<String>,

    /// Frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u32,

    /// Seconds per frame (clamped to 1/30)
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Where to write the trail image
    #[arg(short, long, default_value = "chamber.png")]
    output: PathBuf,

    /// Integrator backend: sequential or parallel
    #[arg(long)]
    backend: Option<Backend>,

    /// Projection for the trail image: topdown or front
    #[arg(long)]
    view: Option<View>,

    /// RNG seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Magnetic field strength
    #[arg(long)]
    field: Option<f32>,

    /// Vapor density in [0, 1]
    #[arg(long)]
    vapor: Option<f32>,

    /// Births per second
    #[arg(long)]
    rate: Option<f32>,

    /// Trail decay per frame in (0, 1)
    #[arg(long)]
    decay: Option<f32>,

    /// Write the effective configuration to this file and continue
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// List the built-in isotopes and exit
    #[arg(long)]
    list_isotopes: bool,

    /// Verbosity level (can be repeated for more detail)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn log_level(&self) -> log::LevelFilter {
        match (self.verbose, self.quiet) {
            (0, true) => log::LevelFilter::Error,
            (0, false) => log::LevelFilter::Warn,
            (1, _) => log::LevelFilter::Info,
            (2, _) => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }

    fn chamber_config(&self) -> Result<ChamberConfig> {
        let mut config = match &self.config {
            Some(path) => ChamberConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ChamberConfig::default(),
        };

        if let Some(isotope) = &self.isotope {
            config.isotope = isotope.clone();
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(view) = self.view {
            config.view = view;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(field) = self.field {
            config.field_strength = field;
        }
        if let Some(vapor) = self.vapor {
            config.vapor_density = vapor;
        }
        if let Some(rate) = self.rate {
            config.emission_rate = rate;
        }
        if let Some(decay) = self.decay {
            config.decay_rate = decay;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG still wins when set.
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(cli.log_level().as_str()),
    )
    .init();

    if cli.list_isotopes {
        for name in IsotopeCatalog::builtin().names() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = cli.chamber_config()?;
    if let Some(path) = &cli.save_config {
        config
            .save(path)
            .with_context(|| format!("Failed to save config {}", path.display()))?;
    }

    let mut sim = Simulation::new(config)?;
    // An explicit rate applies to the chosen isotope even when it has its
    // own default, like cosmic muons.
    if let Some(rate) = cli.rate {
        sim.set_emission_rate(rate);
    }

    let mut clock = FrameClock::fixed(cli.dt);
    for _ in 0..cli.frames {
        sim.step(clock.tick());
    }

    log::info!(
        "Simulated {:.2}s over {} frames: {} live particles, {} recycled while live",
        clock.simulated(),
        sim.steps(),
        sim.active_count(),
        sim.overwritten()
    );

    sim.trails()
        .save_png(&cli.output)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;
    println!("Wrote {}", cli.output.display());

    Ok(())
}
