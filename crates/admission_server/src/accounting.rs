/// Classification of a served response, used to decide which per-worker counter(s) to
/// bump. Error responses classify as [`ResponseClass::Error`] and increment nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
	Static,
	Dynamic,
	Error,
}

/// Per-worker accounting counters. Owned exclusively by one worker thread: written only
/// by that worker, read only to render that worker's own response headers. No lock, no
/// atomics — the spec calls for single-writer single-reader counters precisely to keep
/// the hot path free of cross-thread synchronization.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerCounters {
	pub total_count: u64,
	pub static_count: u64,
	pub dynamic_count: u64,
}

impl WorkerCounters {
	/// Applies the counter update for `class`, in program order, before headers are
	/// rendered — so headers reflect counts including the request that caused them.
	pub fn record(&mut self, class: ResponseClass) {
		match class {
			ResponseClass::Static => {
				self.static_count += 1;
				self.total_count += 1;
			}
			ResponseClass::Dynamic => {
				self.dynamic_count += 1;
				self.total_count += 1;
			}
			ResponseClass::Error => {}
		}
	}
}

/// The six `Stat-*` headers attached to every response that is actually written to a
/// socket. Rendered in canonical `Name: <number>` form.
#[derive(Debug, Clone, Copy)]
pub struct StatHeaders {
	pub arrival_ms: f64,
	pub dispatch_ms: f64,
	pub thread_id: usize,
	pub thread_count: u64,
	pub thread_static: u64,
	pub thread_dynamic: u64,
}

impl StatHeaders {
	#[must_use]
	pub fn new(arrival_ms: f64, dispatch_ms: f64, thread_id: usize, counters: WorkerCounters) -> Self {
		Self {
			arrival_ms,
			dispatch_ms,
			thread_id,
			thread_count: counters.total_count,
			thread_static: counters.static_count,
			thread_dynamic: counters.dynamic_count,
		}
	}

	/// Renders the headers as `Name: value\r\n` lines, ready to be appended to a
	/// response's header block.
	#[must_use]
	pub fn render(&self) -> String {
		format!(
			"Stat-Req-Arrival: {}\r\nStat-Req-Dispatch: {}\r\nStat-Thread-Id: {}\r\nStat-Thread-Count: {}\r\nStat-Thread-Static: {}\r\nStat-Thread-Dynamic: {}\r\n",
			self.arrival_ms, self.dispatch_ms, self.thread_id, self.thread_count, self.thread_static, self.thread_dynamic
		)
	}
}
