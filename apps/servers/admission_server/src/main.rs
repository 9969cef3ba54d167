use admission_server::config::Config;
use admission_server::dispatcher;
use admission_server::error::ServerError;
use admission_server::handler::Handler;
use admission_server::queue::AdmissionQueue;
use admission_server::worker::WorkerPool;
use clap::Parser;
use std::net::TcpListener;
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let config = Config::parse();
	if let Err(error) = run(&config) {
		log::error!("{error}");
		return ExitCode::FAILURE;
	}
	ExitCode::SUCCESS
}

fn run(config: &Config) -> Result<(), ServerError> {
	config.validate()?;

	let addr = format!("0.0.0.0:{}", config.port);
	let listener = TcpListener::bind(&addr).map_err(|source| ServerError::Bind { addr: addr.clone(), source })?;

	log::info!(
		"listening on {addr} threads={} queue_size={} policy={} root={}",
		config.threads,
		config.queue_size,
		config.policy,
		config.root.display()
	);

	let queue = Arc::new(AdmissionQueue::new(config.queue_size, config.policy));
	let handler = Arc::new(Handler::new(config.root.clone()));
	// The pool runs for the lifetime of the process (no graceful shutdown, per spec);
	// it is intentionally never joined on this path.
	let _pool = WorkerPool::spawn(config.threads, Arc::clone(&queue), handler);

	dispatcher::run(&listener, &queue);
}
