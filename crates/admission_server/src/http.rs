use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;

/// An HTTP/1.0 request line, reduced to the two fields the core needs. Header lines are
/// read (so the client's request is fully drained) but their values are discarded — the
/// core subsystem never consults them.
#[derive(Debug, Clone)]
pub struct Request {
	pub method: String,
	pub target: String,
}

/// Reads a request line and header block off `socket`, discarding the headers. Returns
/// `None` if the socket closes or sends a malformed request line before a full request
/// is available — the caller treats that as a non-response (see worker module docs).
pub fn read_request(socket: &TcpStream) -> io::Result<Option<Request>> {
	let mut reader = BufReader::new(socket);

	let mut request_line = String::new();
	if reader.read_line(&mut request_line)? == 0 {
		return Ok(None);
	}
	let mut parts = request_line.trim_end().splitn(3, ' ');
	let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
		return Ok(None);
	};
	let request = Request {
		method: method.to_string(),
		target: target.to_string(),
	};

	loop {
		let mut line = String::new();
		if reader.read_line(&mut line)? == 0 {
			break;
		}
		if line.trim_end().is_empty() {
			break;
		}
	}

	Ok(Some(request))
}

/// HTTP status line plus body, ready to be framed with accounting headers and written.
pub struct RawResponse {
	pub status_line: &'static str,
	pub content_type: &'static str,
	pub body: Vec<u8>,
}

impl RawResponse {
	/// Writes the full response: status line, `Content-Type`, `Content-Length`, the
	/// caller-supplied accounting headers, `Connection: close`, a blank line, and the
	/// body. HTTP/1.0 has no persistent connections (Non-goal), so `Connection: close`
	/// is always sent and the caller always closes the socket afterward.
	pub fn write(&self, mut socket: &TcpStream, stat_headers: &str) -> io::Result<()> {
		write!(
			socket,
			"{}\r\nContent-Type: {}\r\nContent-Length: {}\r\n{stat_headers}Connection: close\r\n\r\n",
			self.status_line,
			self.content_type,
			self.body.len()
		)?;
		socket.write_all(&self.body)?;
		socket.flush()
	}
}
