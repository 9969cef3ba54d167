use crate::connection::Connection;
use crate::policy::Policy;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

/// Outcome of [`AdmissionQueue::try_admit`]. The caller (dispatcher) is responsible for
/// closing any connection carried in `Rejected` or `AdmittedAfterEviction` — the queue
/// itself performs no I/O.
pub enum AdmitOutcome {
	Admitted,
	Rejected(Connection),
	AdmittedAfterEviction(Vec<Connection>),
}

struct QueueState {
	pending: VecDeque<Connection>,
	active: usize,
	rng: StdRng,
}

/// A fixed-capacity buffer of [`Connection`] records shared between the dispatcher
/// (producer) and the worker pool (consumers), gated by one of the four overload
/// policies in [`Policy`].
///
/// `occupancy = pending.len() + active` is the quantity the capacity bound applies to,
/// not `pending.len()` alone — see module docs on why that distinction is the crux of
/// this design. A naive bound on `pending` alone would admit `capacity + worker_count`
/// concurrent requests: `block` would never actually block, and `drop-*` would never
/// drop, once every worker is busy.
pub struct AdmissionQueue {
	capacity: usize,
	policy: Policy,
	state: Mutex<QueueState>,
	pending_available: Condvar,
	capacity_available: Condvar,
}

impl AdmissionQueue {
	#[must_use]
	pub fn new(capacity: usize, policy: Policy) -> Self {
		assert!(capacity >= 1, "admission queue capacity must be at least 1");
		Self {
			capacity,
			policy,
			state: Mutex::new(QueueState {
				pending: VecDeque::with_capacity(capacity),
				active: 0,
				rng: StdRng::from_entropy(),
			}),
			pending_available: Condvar::new(),
			capacity_available: Condvar::new(),
		}
	}

	#[must_use]
	pub const fn capacity(&self) -> usize {
		self.capacity
	}

	#[must_use]
	pub const fn policy(&self) -> Policy {
		self.policy
	}

	/// Current `pending + active`. For diagnostics and white-box invariant tests; not
	/// consulted by any admission decision outside the lock that already holds it.
	#[must_use]
	pub fn occupancy(&self) -> usize {
		let state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
		state.pending.len() + state.active
	}

	/// Submits a newly accepted connection under the queue's configured policy. Atomic
	/// with respect to the occupancy counter: no worker may dequeue or complete a
	/// request while this decision is being made.
	pub fn try_admit(&self, connection: Connection) -> AdmitOutcome {
		let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

		loop {
			let occupancy = state.pending.len() + state.active;
			if occupancy < self.capacity {
				state.pending.push_back(connection);
				self.pending_available.notify_one();
				return AdmitOutcome::Admitted;
			}

			match self.policy {
				Policy::Block => {
					state = self.capacity_available.wait(state).unwrap_or_else(std::sync::PoisonError::into_inner);
				}
				Policy::DropTail => return AdmitOutcome::Rejected(connection),
				Policy::DropHead => {
					let Some(oldest) = state.pending.pop_front() else {
						return AdmitOutcome::Rejected(connection);
					};
					state.pending.push_back(connection);
					return AdmitOutcome::AdmittedAfterEviction(vec![oldest]);
				}
				Policy::DropRandom => {
					let k = (state.pending.len() + 1) / 2;
					if k == 0 {
						return AdmitOutcome::Rejected(connection);
					}
					let evicted = evict_random(&mut state.pending, k, &mut state.rng);
					state.pending.push_back(connection);
					return AdmitOutcome::AdmittedAfterEviction(evicted);
				}
			}
		}
	}

	/// Suspends until a pending record is available, then atomically moves it from
	/// `pending` to `active` — occupancy is unchanged across this transition.
	#[must_use]
	pub fn dequeue(&self) -> Connection {
		let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
		while state.pending.is_empty() {
			state = self.pending_available.wait(state).unwrap_or_else(std::sync::PoisonError::into_inner);
		}
		let connection = state.pending.pop_front().expect("just checked non-empty");
		state.active += 1;
		connection
	}

	/// Releases the `active` slot held by a just-finished response, waking one blocked
	/// producer if any is waiting for capacity.
	pub fn complete(&self) {
		let mut state = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
		state.active -= 1;
		self.capacity_available.notify_one();
	}
}

/// Uniformly samples `k` of the `n` pending records without replacement (Fisher-Yates
/// over an index snapshot) and removes them, preserving the relative order of survivors.
/// Removal proceeds in descending index order so earlier indices stay valid as later
/// ones are removed.
fn evict_random(pending: &mut VecDeque<Connection>, k: usize, rng: &mut StdRng) -> Vec<Connection> {
	let n = pending.len();
	debug_assert!(k <= n);

	let mut indices: Vec<usize> = (0..n).collect();
	indices.shuffle(rng);
	let mut victims = indices[..k].to_vec();
	victims.sort_unstable_by(|a, b| b.cmp(a));

	victims.into_iter().map(|idx| pending.remove(idx).expect("index taken from current pending length")).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::net::{TcpListener, TcpStream};

	fn dummy_connection() -> Connection {
		let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback listener");
		let addr = listener.local_addr().expect("local addr");
		let client = TcpStream::connect(addr).expect("connect loopback");
		let (server_side, _) = listener.accept().expect("accept loopback");
		drop(client);
		Connection::new(server_side)
	}

	#[test]
	fn admits_until_capacity_then_block_suspends() {
		let queue = AdmissionQueue::new(2, Policy::Block);
		assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Admitted));
		assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Admitted));
		assert_eq!(queue.occupancy(), 2);

		let queue = std::sync::Arc::new(queue);
		let blocked = std::sync::Arc::clone(&queue);
		let handle = std::thread::spawn(move || {
			matches!(blocked.try_admit(dummy_connection()), AdmitOutcome::Admitted)
		});

		std::thread::sleep(std::time::Duration::from_millis(50));
		assert!(!handle.is_finished(), "block policy must suspend the caller at capacity");

		let _ = queue.dequeue();
		queue.complete();

		assert!(handle.join().expect("producer thread"));
	}

	#[test]
	fn drop_tail_rejects_newcomer_at_capacity() {
		let queue = AdmissionQueue::new(1, Policy::DropTail);
		assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Admitted));
		assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Rejected(_)));
		assert_eq!(queue.occupancy(), 1);
	}

	#[test]
	fn drop_head_evicts_oldest_pending() {
		let queue = AdmissionQueue::new(2, Policy::DropHead);
		assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Admitted));
		assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Admitted));

		match queue.try_admit(dummy_connection()) {
			AdmitOutcome::AdmittedAfterEviction(evicted) => assert_eq!(evicted.len(), 1),
			_ => panic!("expected an eviction"),
		}
		assert_eq!(queue.occupancy(), 2);
	}

	#[test]
	fn drop_head_rejects_when_nothing_pending() {
		// Capacity 1, occupied by one active (not pending) request: nothing to evict.
		let queue = AdmissionQueue::new(1, Policy::DropHead);
		assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Admitted));
		let _ = queue.dequeue();

		assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Rejected(_)));
	}

	#[test]
	fn drop_random_evicts_ceil_half_of_pending() {
		let queue = AdmissionQueue::new(7, Policy::DropRandom);
		for _ in 0..7 {
			assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Admitted));
		}

		match queue.try_admit(dummy_connection()) {
			AdmitOutcome::AdmittedAfterEviction(evicted) => assert_eq!(evicted.len(), 4), // ceil(7/2)
			_ => panic!("expected an eviction batch"),
		}
		// 7 pending, 4 evicted, 1 newcomer admitted: 7 - 4 + 1 = 4.
		assert_eq!(queue.occupancy(), 4);
	}

	#[test]
	fn occupancy_never_exceeds_capacity_under_concurrent_admission() {
		let queue = std::sync::Arc::new(AdmissionQueue::new(4, Policy::DropTail));
		let mut handles = Vec::new();
		for _ in 0..20 {
			let queue = std::sync::Arc::clone(&queue);
			handles.push(std::thread::spawn(move || {
				let _ = queue.try_admit(dummy_connection());
			}));
		}
		for handle in handles {
			handle.join().expect("admitter thread");
		}
		assert!(queue.occupancy() <= 4);
	}

	#[test]
	fn dequeue_then_complete_frees_capacity_slot() {
		let queue = AdmissionQueue::new(1, Policy::DropTail);
		assert!(matches!(queue.try_admit(dummy_connection()), AdmitOutcome::Admitted));
		assert_eq!(queue.occupancy(), 1);

		let connection = queue.dequeue();
		assert_eq!(queue.occupancy(), 1); // pending -> active, occupancy unchanged
		drop(connection);
		queue.complete();
		assert_eq!(queue.occupancy(), 0);
	}
}
