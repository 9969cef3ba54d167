use crate::connection::Connection;
use crate::queue::{AdmissionQueue, AdmitOutcome};
use std::net::{Shutdown, TcpListener};

/// The single-threaded producer: owns the listening socket, stamps arrival time on
/// every accepted connection, and submits it to the [`AdmissionQueue`] under the
/// configured policy. Never reads from a client socket — all parsing is a worker's job
/// — and never blocks except inside `accept` and inside `try_admit` under `block`.
pub fn run(listener: &TcpListener, queue: &AdmissionQueue) -> ! {
	loop {
		let (socket, peer) = match listener.accept() {
			Ok(accepted) => accepted,
			Err(error) => {
				log::warn!("accept failed: {error}");
				continue;
			}
		};

		let connection = Connection::new(socket);
		log::debug!("accepted connection {} from {peer} under policy {}", connection.request_id, queue.policy());

		match queue.try_admit(connection) {
			AdmitOutcome::Admitted => {}
			AdmitOutcome::Rejected(rejected) => {
				log::warn!("policy {} rejected connection {} at capacity {}", queue.policy(), rejected.request_id, queue.capacity());
				close_without_response(&rejected);
			}
			AdmitOutcome::AdmittedAfterEviction(evicted) => {
				log::warn!("policy {} evicted {} pending connection(s) to admit a new arrival", queue.policy(), evicted.len());
				for victim in &evicted {
					close_without_response(victim);
				}
			}
		}
	}
}

/// Tears down an evicted or rejected connection without writing any HTTP response. The
/// client must observe this as a peer reset rather than a well-formed error — shutting
/// down both halves before the socket drops ensures that.
fn close_without_response(connection: &Connection) {
	let _ = connection.socket.shutdown(Shutdown::Both);
}
