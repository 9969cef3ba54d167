use crate::accounting::{StatHeaders, WorkerCounters};
use crate::connection::{now_ms, Connection};
use crate::handler::Handler;
use crate::http::read_request;
use crate::queue::AdmissionQueue;
use std::net::Shutdown;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// A fixed pool of `W` threads draining the [`AdmissionQueue`]. Each worker owns its
/// [`WorkerCounters`] outright — no other thread ever reads or writes them — so the
/// accounting hot path needs no lock.
pub struct WorkerPool {
	handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
	/// Spawns `worker_count` threads, each running [`worker_loop`] against the shared
	/// `queue` and `handler`.
	#[must_use]
	pub fn spawn(worker_count: usize, queue: Arc<AdmissionQueue>, handler: Arc<Handler>) -> Self {
		let handles = (0..worker_count)
			.map(|id| {
				let queue = Arc::clone(&queue);
				let handler = Arc::clone(&handler);
				thread::Builder::new()
					.name(format!("worker-{id}"))
					.spawn(move || worker_loop(id, &queue, &handler))
					.expect("failed to spawn worker thread")
			})
			.collect();

		Self { handles }
	}

	/// Blocks until every worker thread has exited. Workers never exit on their own
	/// (graceful shutdown after in-flight completion is a Non-goal), so in practice this
	/// only returns if a worker thread panicked past its `catch_unwind` boundary, which
	/// should not happen.
	pub fn join(self) {
		for handle in self.handles {
			let _ = handle.join();
		}
	}
}

fn worker_loop(id: usize, queue: &AdmissionQueue, handler: &Handler) {
	let mut counters = WorkerCounters::default();

	loop {
		let connection = queue.dequeue();
		let request_id = connection.request_id;

		let panicked = panic::catch_unwind(AssertUnwindSafe(|| serve_one(id, &connection, handler, &mut counters))).is_err();
		if panicked {
			log::warn!("worker {id} recovered from a panic while serving request {request_id}");
		}

		let _ = connection.socket.shutdown(Shutdown::Both);
		queue.complete();
	}
}

/// Parses the request, invokes the handler, attaches accounting headers (reflecting
/// `counters` *after* the class-dependent increment), and writes the response. Leaves
/// the socket untouched — neither parsed nor written to — if the request can't even be
/// parsed, matching the spec's "close without response" disposition for malformed input.
fn serve_one(id: usize, connection: &Connection, handler: &Handler, counters: &mut WorkerCounters) {
	let handler_start = now_ms();
	let dispatch_ms = handler_start - connection.arrival_time;

	let Some(request) = read_request(&connection.socket).unwrap_or(None) else {
		log::debug!("worker {id} dropped malformed request {}", connection.request_id);
		return;
	};

	let (response, class) = handler.handle(&request);
	counters.record(class);

	let stat_headers = StatHeaders::new(connection.arrival_time, dispatch_ms, id, *counters).render();
	if let Err(error) = response.write(&connection.socket, &stat_headers) {
		log::warn!("worker {id} failed writing response for request {}: {error}", connection.request_id);
	} else {
		log::debug!("worker {id} served request {} class={:?} dispatch_ms={:.2}", connection.request_id, class, dispatch_ms);
	}
}
