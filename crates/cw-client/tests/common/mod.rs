//! In-process fake backend built on tiny_http.

use std::io::Read;
use std::thread;

/// A request the fake backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub body: String,
}

/// Serves a fixed list of `(status, body)` responses, one per request, then
/// stops.
pub struct FakeBackend {
    pub base_url: String,
    handle: Option<thread::JoinHandle<Vec<Recorded>>>,
}

impl FakeBackend {
    pub fn start(responses: Vec<(u16, &str)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("bind fake backend");
        let addr = server
            .server_addr()
            .to_ip()
            .expect("fake backend has an IP address");
        let responses: Vec<(u16, String)> = responses
            .into_iter()
            .map(|(status, body)| (status, body.to_string()))
            .collect();

        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let mut request = match server.recv() {
                    Ok(r) => r,
                    Err(_) => break,
                };
                let mut content = String::new();
                let _ = request.as_reader().read_to_string(&mut content);
                seen.push(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body: content,
                });
                let response = tiny_http::Response::from_string(body).with_status_code(status);
                let _ = request.respond(response);
            }
            seen
        });

        Self {
            base_url: format!("http://{}", addr),
            handle: Some(handle),
        }
    }

    /// Wait for the scripted responses to be consumed and return what the
    /// server saw.
    pub fn finish(mut self) -> Vec<Recorded> {
        self.handle
            .take()
            .map(|h| h.join().expect("fake backend thread"))
            .unwrap_or_default()
    }
}
