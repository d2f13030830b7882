//! Shared helpers for cardwatch CLI tests.

#![allow(dead_code)]

use assert_cmd::Command;
use std::io::Read;
use std::path::Path;
use std::thread;

/// The report template shipped with the renderer.
pub const TEMPLATE: &str = include_str!("../../../cw-report/templates/report-template.html");

/// `cardwatch` isolated from the user's config and environment.
pub fn cardwatch(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cardwatch").expect("cardwatch binary should exist");
    cmd.env("XDG_CONFIG_HOME", home)
        .env_remove("CARDWATCH_API_URL")
        .env_remove("CARDWATCH_CONFIG")
        .env_remove("CW_LOG")
        .env_remove("RUST_LOG")
        .current_dir(home);
    cmd
}

/// A request the fake backend received.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub body: String,
}

/// Answers each request with the next scripted `(status, body)`.
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
                let Ok(mut request) = server.recv() else { break };
                let mut content = String::new();
                let _ = request.as_reader().read_to_string(&mut content);
                seen.push(Recorded {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    body: content,
                });
                let _ = request.respond(tiny_http::Response::from_string(body).with_status_code(status));
            }
            seen
        });

        Self {
            base_url: format!("http://{}", addr),
            handle: Some(handle),
        }
    }

    pub fn finish(mut self) -> Vec<Recorded> {
        self.handle
            .take()
            .map(|h| h.join().expect("fake backend thread"))
            .unwrap_or_default()
    }
}
