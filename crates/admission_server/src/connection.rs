use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Monotonic source for [`Connection::request_id`]. Lock-free and independent of the
/// admission queue's mutex since it carries no consistency requirement with occupancy.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(0);

/// A connection accepted off the listening socket, carrying the accounting timestamps
/// the worker that eventually serves it will need.
///
/// Exclusively owned by whichever component currently holds it: the [`crate::dispatcher`]
/// before submission, the [`crate::queue::AdmissionQueue`] while waiting, the worker
/// after dequeue.
pub struct Connection {
	pub socket: TcpStream,
	/// Milliseconds since the Unix epoch, stamped at accept time.
	pub arrival_time: f64,
	pub request_id: u64,
}

impl Connection {
	/// Stamps `arrival_time` immediately, before any queue interaction, per the spec's
	/// requirement that the timestamp reflect acceptance rather than enqueue.
	#[must_use]
	pub fn new(socket: TcpStream) -> Self {
		Self {
			socket,
			arrival_time: now_ms(),
			request_id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
		}
	}
}

/// Milliseconds since the Unix epoch as a float, matching the wire representation of
/// `Stat-Req-Arrival`.
#[must_use]
pub fn now_ms() -> f64 {
	let duration = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
	duration.as_secs_f64() * 1000.0
}
