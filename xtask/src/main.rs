use clap::{Parser, Subcommand};
#[cfg(not(test))]
use xtask::*;

#[derive(Parser)]
#[command(author, version, about = "Development tasks for fftprobe")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Build,
    Test,
    Clippy,
    Fmt,
    Analyze,
    /// Run one of the demos under demos/
    Demo {
        #[arg(default_value = "basic_usage")]
        name: String,
    },
    Sanity {
        #[arg(long, default_value_t = 100)]
        ticks: usize,
        #[arg(long, default_value_t = 1)]
        dimensions: u8,
    },
}

#[cfg(not(test))]
fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = detect_config();

    let status = match cli.command {
        Commands::Build => build_command(&cfg).status(),
        Commands::Test => test_command(&cfg).status(),
        Commands::Clippy => clippy_command().status(),
        Commands::Fmt => fmt_command().status(),
        Commands::Analyze => {
            let fmt = fmt_command().status()?;
            if !fmt.success() {
                Ok(fmt)
            } else {
                clippy_command().status()
            }
        }
        Commands::Demo { name } => demo_command(&cfg, &name).status(),
        Commands::Sanity { ticks, dimensions } => {
            if !(1..=2).contains(&dimensions) {
                anyhow::bail!("dimensions must be 1 or 2, got {dimensions}");
            }
            sanity_command(ticks, dimensions).status()
        }
    }?;

    std::process::exit(status.code().unwrap_or(1));
}
