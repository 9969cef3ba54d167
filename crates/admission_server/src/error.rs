use thiserror::Error;

/// Errors that can surface from configuration parsing or server startup. Anything that
/// reaches this enum is reported to stderr and ends the process with a non-zero exit
/// code. Per-connection failures never reach here: [`crate::handler::Handler`] maps them
/// to ordinary HTTP error responses instead of propagating a `Result`.
#[derive(Error, Debug)]
pub enum ServerError {
	#[error("invalid argument: {0}")]
	InvalidArgument(String),

	#[error("failed to bind {addr}: {source}")]
	Bind { addr: String, source: std::io::Error },
}
