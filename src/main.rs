use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger::Env;
use nix::unistd::getuid;
use sui_starter::config::StarterConfig;
use sui_starter::privilege::ensure_privileged;
use sui_starter::server::LaunchParameters;
use sui_starter::starter::start_server;

/// Environment variable holding the `env_logger` filter.
const LOG_ENV: &str = "SUI_STARTER_LOG";

#[derive(Parser)]
#[command(name = "sui-starter")]
#[command(about = "Wait for zygote in the background, then exec the Sui server", long_about = None)]
#[command(version)]
struct Cli {
    /// Server dex, exported as CLASSPATH
    payload: PathBuf,

    /// Writable data directory, also used as the native library path
    data_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(e) = run(cli) {
        log::error!("{e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    ensure_privileged(getuid())?;
    log::info!("starter begin");

    let config = StarterConfig::load_or_default(&cli.data_dir);
    let params = LaunchParameters::new(cli.payload, cli.data_dir);
    start_server(&params, &config)
}

fn init_logging() {
    let env = Env::default().filter_or(LOG_ENV, "info");
    // Ignore the error: a logger is already installed only if we were embedded
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_secs()
        .format_target(false)
        .try_init();
}
