use std::env;
use std::process::Command;

/// Cargo feature selection derived from the host machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub features: Vec<String>,
    /// Pass `--no-default-features` so only `features` are enabled.
    pub minimal: bool,
}

impl BuildConfig {
    /// Join features into a single string suitable for passing to cargo.
    pub fn features_arg(&self) -> Option<String> {
        if self.features.is_empty() {
            None
        } else {
            Some(self.features.join(" "))
        }
    }

    fn apply(&self, cmd: &mut Command) {
        if self.minimal {
            cmd.arg("--no-default-features");
        }
        if let Some(f) = self.features_arg() {
            cmd.arg("--features").arg(f);
        }
    }
}

/// Detect build configuration from the current machine.
///
/// `FFTPROBE_FEATURES` adds features; `FFTPROBE_MINIMAL=1` disables the
/// default ones first.
pub fn detect_config() -> BuildConfig {
    let nproc = detect_nproc();
    let extra = env::var("FFTPROBE_FEATURES").unwrap_or_default();
    let minimal = env::var("FFTPROBE_MINIMAL").is_ok_and(|v| v == "1");
    compute_config(nproc, &extra, minimal)
}

fn detect_nproc() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Compute a [`BuildConfig`] from supplied inputs. This is separated for testing.
pub fn compute_config(nproc: usize, extra: &str, minimal: bool) -> BuildConfig {
    let mut features = Vec::new();
    if minimal && nproc > 1 {
        features.push("parallel".to_string());
    }
    for feat in extra.split_whitespace() {
        if !features.iter().any(|f| f == feat) {
            features.push(feat.to_string());
        }
    }
    BuildConfig { features, minimal }
}

pub fn build_command(cfg: &BuildConfig) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg("build");
    cfg.apply(&mut cmd);
    cmd
}

pub fn test_command(cfg: &BuildConfig) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.arg("test");
    cfg.apply(&mut cmd);
    cmd
}

pub fn clippy_command() -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["clippy", "--all-targets", "--all-features"]);
    cmd
}

pub fn fmt_command() -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["fmt", "--all"]);
    cmd
}

pub fn demo_command(cfg: &BuildConfig, name: &str) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "--example", name]);
    cfg.apply(&mut cmd);
    cmd
}

/// Run the headless driver for `ticks` ticks in one or two dimensions.
pub fn sanity_command(ticks: usize, dimensions: u8) -> Command {
    let mut cmd = Command::new("cargo");
    cmd.args(["run", "-r", "-p", "sanity-check", "--"]);
    cmd.arg("--ticks").arg(ticks.to_string());
    cmd.arg("--dimensions").arg(dimensions.to_string());
    cmd
}
