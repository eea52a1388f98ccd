//! Fork, detach, wait for zygote, exec the server.

use std::convert::Infallible;
use std::process;

use anyhow::Context;
use nix::unistd::{ForkResult, fork};

use crate::config::StarterConfig;
use crate::daemon;
use crate::error::StarterError;
use crate::platform::ApiLevel;
use crate::process::{ProcScanner, ProcessSource};
use crate::server::{
    ArgumentBuilder, ArgumentVector, DEBUGGABLE, LaunchParameters, replace_image,
};

/// Hand the launch off to a background child and return in the parent.
///
/// The parent does not wait for the child. The child never returns from this
/// function: it either becomes the server through exec or exits with status 1.
#[allow(unsafe_code)]
pub fn start_server(params: &LaunchParameters, config: &StarterConfig) -> anyhow::Result<()> {
    // SAFETY: the launcher is single-threaded, so the child may run arbitrary code.
    match unsafe { fork() } {
        Ok(ForkResult::Parent { child }) => {
            log::debug!("Started background starter {child}");
            Ok(())
        }
        Ok(ForkResult::Child) => {
            let Err(err) = run_child(params, config);
            log::error!("{err:#}");
            process::exit(1);
        }
        Err(errno) => Err(StarterError::ForkFailed { errno }.into()),
    }
}

fn run_child(params: &LaunchParameters, config: &StarterConfig) -> anyhow::Result<Infallible> {
    daemon::detach()?;
    launch(params, config, &mut ProcScanner::new())
}

/// Wait for zygote on `source`, then exec the server.
///
/// Runs in whatever process calls it; [`start_server`] calls it from the
/// detached child.
pub fn launch<S: ProcessSource + ?Sized>(
    params: &LaunchParameters,
    config: &StarterConfig,
    source: &mut S,
) -> anyhow::Result<Infallible> {
    let argv = prepare(params, config, source)?;
    replace_image(params, &argv).context("cannot start server")
}

/// Everything [`launch`] does short of exec: wait for zygote and build the
/// `app_process` command line.
pub fn prepare<S: ProcessSource + ?Sized>(
    params: &LaunchParameters,
    config: &StarterConfig,
    source: &mut S,
) -> anyhow::Result<ArgumentVector> {
    config.detector().wait_for(source)?;

    let mut builder = ArgumentBuilder::new(params).debuggable(DEBUGGABLE);
    if DEBUGGABLE {
        let api_level = config.api_level_override().unwrap_or_else(ApiLevel::query);
        builder = builder.api_level(api_level);
    }
    builder
        .build()
        .context("cannot build app_process arguments")
}
