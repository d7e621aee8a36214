//! One-shot HTTP servers for exercising the client without a real service.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Barrier};
use std::thread;

/// A canned reply for requests whose path matches `path`.
///
/// With `hold` set, the reply is withheld until the test also waits on the barrier.
pub struct Route {
    pub path: &'static str,
    pub hold: Option<Arc<Barrier>>,
    pub response: String,
}

pub fn json_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

pub fn raw_response(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
}

/// Serve exactly one connection with `response`; the raw request is sent on the channel.
pub fn serve_once(response: String) -> (String, Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let request = read_request(&mut stream);
            let _ = stream.write_all(response.as_bytes());
            let _ = tx.send(request);
        }
    });
    (format!("http://{addr}"), rx)
}

/// Serve `connections` connections, each answered by the route matching its path
/// once that route's hold (if any) is released.
pub fn serve_routes(routes: Vec<Route>, connections: usize) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);
    thread::spawn(move || {
        for _ in 0..connections {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let routes = routes.clone();
            thread::spawn(move || {
                let request = read_request(&mut stream);
                let path = request_line(&request).split(' ').nth(1).unwrap_or("").to_string();
                if let Some(route) = routes.iter().find(|r| r.path == path) {
                    if let Some(hold) = &route.hold {
                        hold.wait();
                    }
                    let _ = stream.write_all(route.response.as_bytes());
                }
            });
        }
    });
    format!("http://{addr}")
}

pub fn request_line(request: &str) -> &str {
    request.lines().next().unwrap_or("")
}

pub fn request_body(request: &str) -> &str {
    request.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}
