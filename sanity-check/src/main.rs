use clap::Parser;
use fftprobe::config::{DEFAULT_GRID_SIDE, DEFAULT_LINE_LENGTH};
use fftprobe::{
    BackendKind, Dimensionality, FilterKind, Pipeline, PipelineConfig, SignalKind,
};
use sanity_check::{tick_line, write_csv};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Run the fftprobe pipeline headless and report backend discrepancies.
#[derive(Parser)]
struct Args {
    /// Number of ticks to run
    #[arg(long, default_value_t = 100)]
    ticks: usize,

    /// Time advanced per tick, in seconds
    #[arg(long, default_value_t = 0.02)]
    dt: f64,

    /// Time of the first tick
    #[arg(long, default_value_t = 0.0)]
    start: f64,

    /// Signal: square, sine, sawtooth, sinc or random
    #[arg(long, default_value = "square")]
    signal: SignalKind,

    /// Filter: none, cut-large, cut-medium, cut-short, exp, gaussian or inverse
    #[arg(long, default_value = "none")]
    filter: FilterKind,

    /// Filter the accelerated spectrum with the inverted frequency convention
    #[arg(long)]
    inverted: bool,

    /// 1 for a line, 2 for a square grid [env: FFTPROBE_DIMENSIONS, default 1]
    #[arg(long)]
    dimensions: Option<Dimensionality>,

    /// Samples per line or grid side [env: FFTPROBE_SIGNAL_LENGTH, default
    /// 1024 for lines, 16 for grids]
    #[arg(long)]
    size: Option<usize>,

    /// Backend that filters and reconstructs: reference or external
    #[arg(long, default_value = "reference")]
    primary: BackendKind,

    /// Horizontal coordinate scale of generated grids
    #[arg(long, default_value_t = 1.0)]
    scale_u: f64,

    /// Vertical coordinate scale of generated grids
    #[arg(long, default_value_t = 1.0)]
    scale_v: f64,

    /// Seed for the random signal [env: FFTPROBE_SEED, default 0]
    #[arg(long)]
    seed: Option<u64>,

    /// Worker threads for the accelerated backend, 0 for one per CPU
    /// [env: FFTPROBE_THREADS, default 0]
    #[arg(long)]
    threads: Option<usize>,

    /// Butterflies per task on the thread pool, 0 for the built-in default
    /// [env: FFTPROBE_BLOCK_SIZE, default 0]
    #[arg(long)]
    block_size: Option<usize>,

    /// Fail if a tick's headline discrepancy exceeds this total
    #[arg(long)]
    tolerance: Option<f64>,

    /// Write the final tick as CSV
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Print only the final summary
    #[arg(long, short)]
    quiet: bool,

    /// Log at debug level
    #[arg(long, short)]
    verbose: bool,
}

impl Args {
    /// Environment overrides first, then explicit flags.
    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::from_env();
        if let Some(dimensions) = self.dimensions {
            if dimensions != config.dimensions {
                config.dimensions = dimensions;
                config.signal_length = match dimensions {
                    Dimensionality::One => DEFAULT_LINE_LENGTH,
                    Dimensionality::Two => DEFAULT_GRID_SIDE,
                };
            }
        }
        if let Some(size) = self.size {
            config.signal_length = size;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(threads) = self.threads {
            config.threads = threads;
        }
        if let Some(block_size) = self.block_size {
            config.block_size = block_size;
        }
        config.primary = self.primary;
        config.signal = self.signal;
        config.filter = self.filter;
        config.inverted = self.inverted;
        config.scale = (self.scale_u, self.scale_v);
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let mut logger = env_logger::Builder::from_default_env();
    if args.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let mut pipeline = Pipeline::start(args.config())?;
    let shape = pipeline.shape();
    println!(
        "{} {:?}, backends {:?}, primary {}",
        pipeline.config().dimensions,
        shape,
        pipeline.backends(),
        pipeline.primary().map_or("none", |k| k.name())
    );
    for description in pipeline.backend_descriptions() {
        println!("backend: {description}");
    }
    for fault in pipeline.faults() {
        println!("unavailable: {fault}");
    }

    let mut worst = 0.0f64;
    for tick in 0..args.ticks {
        let t = args.start + tick as f64 * args.dt;
        let report = pipeline.tick(t)?;
        if let Some(d) = report.discrepancy {
            worst = worst.max(d.total());
            if let Some(tol) = args.tolerance {
                if d.total() > tol {
                    return Err(format!("t={t:.3}: {d} exceeds tolerance {tol}").into());
                }
            }
        }
        if !args.quiet {
            println!("{}", tick_line(&report));
        }
        let last = tick + 1 == args.ticks;
        if let (true, Some(path)) = (last, args.dump.as_ref()) {
            write_csv(BufWriter::new(File::create(path)?), shape, &report)?;
            println!("wrote {}", path.display());
        }
    }

    println!("{} ticks, worst total discrepancy {worst:.3e}", args.ticks);
    pipeline.shutdown();
    Ok(())
}
