use std::convert::Infallible;
use std::ffi::CStr;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::errno::Errno;
use nix::unistd::execvp;

use super::{ArgumentVector, CLASSPATH_ENV, LaunchParameters};
use crate::error::StarterError;

/// Export the payload as `CLASSPATH` and exec into `argv`.
///
/// Never returns on success. Must only be called from the single-threaded
/// daemon child: it mutates the process environment.
pub fn replace_image(
    params: &LaunchParameters,
    argv: &ArgumentVector,
) -> Result<Infallible, StarterError> {
    export_classpath(params.payload())?;
    log::info!("exec app_process...");
    exec_vector(argv)
}

/// `execvp(argv[0], argv)`, searching `PATH` when `argv[0]` has no slash.
pub fn exec_vector(argv: &ArgumentVector) -> Result<Infallible, StarterError> {
    let Some(program) = argv.program() else {
        return Err(StarterError::ExecFailed {
            program: String::new(),
            errno: Errno::EINVAL,
        });
    };
    let args: Vec<&CStr> = argv.args().collect();
    log::debug!("argv: {:?}", argv.to_strings());

    execvp(program, &args).map_err(|errno| StarterError::ExecFailed {
        program: program.to_string_lossy().into_owned(),
        errno,
    })
}

#[allow(unsafe_code)]
fn export_classpath(payload: &Path) -> Result<(), StarterError> {
    if payload.as_os_str().as_bytes().contains(&0) {
        return Err(StarterError::InvalidArgument {
            argument: payload.to_string_lossy().into_owned(),
        });
    }
    // SAFETY: only reached in the forked daemon child, which never spawns threads.
    unsafe { std::env::set_var(CLASSPATH_ENV, payload) };
    Ok(())
}
