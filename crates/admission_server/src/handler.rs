use crate::accounting::ResponseClass;
use crate::http::{RawResponse, Request};
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolves requests against a document root: static files read straight off disk,
/// `*.cgi` targets executed as child processes. This is the concrete implementation of
/// the request-handler contract the distilled spec treats as an external collaborator
/// (`handle(socket) -> Static | Dynamic | NotFound | Forbidden | NotImplemented`).
pub struct Handler {
	document_root: PathBuf,
}

impl Handler {
	#[must_use]
	pub fn new(document_root: PathBuf) -> Self {
		Self { document_root }
	}

	/// Produces a response for `request`. Never panics on attacker-controlled input:
	/// path traversal, missing files, and unreadable files all fall through to a
	/// well-formed HTTP error response rather than an `Err`.
	#[must_use]
	pub fn handle(&self, request: &Request) -> (RawResponse, ResponseClass) {
		if request.method != "GET" {
			return (not_implemented(), ResponseClass::Error);
		}

		let Some(resolved) = self.resolve(&request.target) else {
			return (not_found(), ResponseClass::Error);
		};

		if is_cgi(&request.target) {
			self.run_cgi(&resolved)
		} else {
			serve_static(&resolved)
		}
	}

	/// Joins `target` onto the document root, rejecting any path segment that would
	/// escape it (`..`). This is a lexical check rather than `canonicalize`, since the
	/// target file may not exist yet and 404 is itself a valid, expected outcome.
	fn resolve(&self, target: &str) -> Option<PathBuf> {
		let relative = target.trim_start_matches('/');
		if relative.split('/').any(|segment| segment == "..") {
			return None;
		}
		Some(self.document_root.join(relative))
	}

	fn run_cgi(&self, script: &Path) -> (RawResponse, ResponseClass) {
		let output = Command::new(script).current_dir(&self.document_root).output();

		match output {
			Ok(output) if output.status.success() => {
				let (content_type, body) = split_cgi_header(&output.stdout);
				(
					RawResponse {
						status_line: "HTTP/1.0 200 OK",
						content_type,
						body,
					},
					ResponseClass::Dynamic,
				)
			}
			Ok(_failed) => (not_found(), ResponseClass::Error),
			Err(error) if error.kind() == io::ErrorKind::PermissionDenied => (forbidden(), ResponseClass::Error),
			Err(_not_found_or_not_executable) => (not_found(), ResponseClass::Error),
		}
	}
}

/// A CGI script may prefix its stdout with a `Content-Type: ...` line; if present, it is
/// consumed and used as the response's content type, and the remainder becomes the body.
/// Otherwise the whole output is the body, typed as `text/plain`.
fn split_cgi_header(stdout: &[u8]) -> (&'static str, Vec<u8>) {
	const PREFIX: &[u8] = b"Content-Type: ";
	if let Some(rest) = stdout.strip_prefix(PREFIX) {
		if let Some(newline) = rest.iter().position(|&b| b == b'\n') {
			let declared = String::from_utf8_lossy(&rest[..newline]).trim().to_string();
			let body = rest[newline + 1..].to_vec();
			return (leak_content_type(&declared), body);
		}
	}
	("text/plain", stdout.to_vec())
}

/// Content types observed in practice are a small fixed set; map onto `'static` rather
/// than allocate a fresh `String` header value per response.
fn leak_content_type(declared: &str) -> &'static str {
	match declared {
		"text/html" => "text/html",
		"application/json" => "application/json",
		"application/xml" => "application/xml",
		_ => "text/plain",
	}
}

fn is_cgi(target: &str) -> bool {
	target.ends_with(".cgi")
}

fn serve_static(path: &Path) -> (RawResponse, ResponseClass) {
	if path.is_dir() {
		return (not_found(), ResponseClass::Error);
	}

	match std::fs::read(path) {
		Ok(body) => (
			RawResponse {
				status_line: "HTTP/1.0 200 OK",
				content_type: content_type_for(path),
				body,
			},
			ResponseClass::Static,
		),
		Err(error) if error.kind() == io::ErrorKind::PermissionDenied => (forbidden(), ResponseClass::Error),
		Err(_not_found) => (not_found(), ResponseClass::Error),
	}
}

fn content_type_for(path: &Path) -> &'static str {
	match path.extension().and_then(|ext| ext.to_str()) {
		Some("html") | Some("htm") => "text/html",
		Some("txt") => "text/plain",
		Some("jpg") | Some("jpeg") => "image/jpeg",
		Some("png") => "image/png",
		Some("css") => "text/css",
		Some("js") => "application/javascript",
		_ => "application/octet-stream",
	}
}

fn not_found() -> RawResponse {
	RawResponse {
		status_line: "HTTP/1.0 404 Not Found",
		content_type: "text/plain",
		body: b"Not Found".to_vec(),
	}
}

fn forbidden() -> RawResponse {
	RawResponse {
		status_line: "HTTP/1.0 403 Forbidden",
		content_type: "text/plain",
		body: b"Forbidden".to_vec(),
	}
}

fn not_implemented() -> RawResponse {
	RawResponse {
		status_line: "HTTP/1.0 501 Not Implemented",
		content_type: "text/plain",
		body: b"Not Implemented".to_vec(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use std::os::unix::fs::PermissionsExt;

	fn request(method: &str, target: &str) -> Request {
		Request {
			method: method.to_string(),
			target: target.to_string(),
		}
	}

	#[test]
	fn serves_existing_static_file_as_200() {
		let dir = tempfile::tempdir().expect("tempdir");
		fs::write(dir.path().join("home.html"), b"<html></html>").expect("write fixture");
		let handler = Handler::new(dir.path().to_path_buf());

		let (response, class) = handler.handle(&request("GET", "/home.html"));
		assert_eq!(response.status_line, "HTTP/1.0 200 OK");
		assert_eq!(class, ResponseClass::Static);
		assert_eq!(response.content_type, "text/html");
	}

	#[test]
	fn missing_file_is_404() {
		let dir = tempfile::tempdir().expect("tempdir");
		let handler = Handler::new(dir.path().to_path_buf());

		let (response, class) = handler.handle(&request("GET", "/not_found"));
		assert_eq!(response.status_line, "HTTP/1.0 404 Not Found");
		assert_eq!(class, ResponseClass::Error);
	}

	#[test]
	fn unreadable_file_is_403() {
		let dir = tempfile::tempdir().expect("tempdir");
		let path = dir.path().join("forbidden.html");
		fs::write(&path, b"secret").expect("write fixture");
		fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).expect("chmod");
		let handler = Handler::new(dir.path().to_path_buf());

		let (response, class) = handler.handle(&request("GET", "/forbidden.html"));
		fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).expect("restore perms for cleanup");

		assert_eq!(response.status_line, "HTTP/1.0 403 Forbidden");
		assert_eq!(class, ResponseClass::Error);
	}

	#[test]
	fn non_get_method_is_501() {
		let dir = tempfile::tempdir().expect("tempdir");
		let handler = Handler::new(dir.path().to_path_buf());

		let (response, class) = handler.handle(&request("POST", "/home.html"));
		assert_eq!(response.status_line, "HTTP/1.0 501 Not Implemented");
		assert_eq!(class, ResponseClass::Error);
	}

	#[test]
	fn path_traversal_is_rejected_as_404() {
		let dir = tempfile::tempdir().expect("tempdir");
		let handler = Handler::new(dir.path().to_path_buf());

		let (response, _class) = handler.handle(&request("GET", "/../etc/passwd"));
		assert_eq!(response.status_line, "HTTP/1.0 404 Not Found");
	}

	#[test]
	fn cgi_script_output_is_dynamic() {
		let dir = tempfile::tempdir().expect("tempdir");
		let script_path = dir.path().join("output.cgi");
		fs::write(&script_path, "#!/bin/sh\necho -n hi\n").expect("write script");
		fs::set_permissions(&script_path, fs::Permissions::from_mode(0o755)).expect("chmod +x");
		let handler = Handler::new(dir.path().to_path_buf());

		let (response, class) = handler.handle(&request("GET", "/output.cgi"));
		assert_eq!(response.status_line, "HTTP/1.0 200 OK");
		assert_eq!(class, ResponseClass::Dynamic);
		assert_eq!(response.body, b"hi");
	}
}
