use crate::policy::Policy;
use clap::Parser;
use std::path::PathBuf;

/// `server <port> <threads> <queue_size> <policy> [--root <dir>]`
///
/// The first four positional arguments mirror the CLI literally; `--root` is an
/// addition so the static/dynamic handler can be pointed at a fixture directory instead
/// of assuming the launch directory always holds `home.html` / `output.cgi`.
#[derive(Parser, Debug)]
#[command(name = "server", author, version, about = "HTTP/1.0 origin server with admission-controlled dispatch")]
pub struct Config {
	/// TCP port to listen on.
	pub port: u16,

	/// Number of worker threads in the fixed pool.
	pub threads: usize,

	/// Maximum occupancy (pending + active) the admission queue allows.
	pub queue_size: usize,

	/// Overload policy applied once occupancy reaches `queue_size`.
	#[arg(value_enum)]
	pub policy: Policy,

	/// Document root static paths and `.cgi` scripts resolve against.
	#[arg(long, default_value = ".")]
	pub root: PathBuf,
}

impl Config {
	/// Validates the fields clap alone can't express (`threads >= 1`, `queue_size >= 1`).
	pub fn validate(&self) -> Result<(), crate::error::ServerError> {
		if self.threads == 0 {
			return Err(crate::error::ServerError::InvalidArgument("threads must be at least 1".to_string()));
		}
		if self.queue_size == 0 {
			return Err(crate::error::ServerError::InvalidArgument("queue_size must be at least 1".to_string()));
		}
		Ok(())
	}
}
