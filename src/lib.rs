pub mod config;
pub mod daemon;
pub mod error;
pub mod platform;
pub mod privilege;
pub mod process;
pub mod server;
pub mod starter;

pub use error::StarterError;
