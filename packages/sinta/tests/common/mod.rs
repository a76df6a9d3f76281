#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

use sinta::{PortalConfig, session::SessionState};

pub const USERNAME: &str = "dosen@univ.ac.id";
pub const PASSWORD: &str = "rahasia";
pub const SESSION_COOKIE: &str = "sinta_session";
pub const LOGIN_ERROR: &str = "Username or password is wrong";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub cookie: Option<String>,
    pub csrf_header: Option<String>,
    pub body: String,
}

#[derive(Debug, Default)]
struct PortalState {
    csrf_token: Option<String>,
    valid_sessions: HashSet<String>,
    issued: u32,
    pages: HashMap<String, String>,
    failing: HashSet<String>,
    requests: Vec<RecordedRequest>,
}

/// In-process stand-in for the portal: login form, session probe, listing pages.
pub struct StubPortal {
    pub base_url: String,
    state: Arc<Mutex<PortalState>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StubPortal {
    pub fn spawn(csrf_token: Option<&str>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start stub portal");
        let base_url = format!("http://{}/", server.server_addr());
        let state = Arc::new(Mutex::new(PortalState {
            csrf_token: csrf_token.map(str::to_string),
            ..PortalState::default()
        }));

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let shared = Arc::clone(&state);
        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }
                let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let header = |name: &'static str| {
                    request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv(name))
                        .map(|h| h.value.as_str().to_string())
                };
                let cookie = header("Cookie");
                let csrf_header = header("X-CSRF-TOKEN");
                let mut body = String::new();
                let _ = request.as_reader().read_to_string(&mut body);
                let recorded = RecordedRequest {
                    method: request.method().to_string(),
                    url: request.url().to_string(),
                    cookie,
                    csrf_header,
                    body,
                };

                let response = {
                    let mut state = shared.lock().unwrap();
                    state.requests.push(recorded.clone());
                    route(&mut state, &recorded)
                };
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn config(&self, session_file: &std::path::Path) -> PortalConfig {
        PortalConfig::with_base_url(&self.base_url)
            .unwrap()
            .session_file(session_file)
    }

    pub fn accept_session(&self, value: &str) {
        self.state
            .lock()
            .unwrap()
            .valid_sessions
            .insert(value.to_string());
    }

    /// Serve `html` for `path_and_query`, e.g. `/authors/profile/1?page=1&view=books`.
    pub fn page(&self, path_and_query: &str, html: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .pages
            .insert(path_and_query.to_string(), html.into());
    }

    pub fn fail(&self, path_and_query: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(path_and_query.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.state.lock().unwrap().requests.clear();
    }

    pub fn login_posts(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "POST")
            .collect()
    }

    pub fn requested(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.url == url).count()
    }
}

impl Drop for StubPortal {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

type Response = tiny_http::Response<std::io::Cursor<Vec<u8>>>;

fn html(body: &str) -> Response {
    tiny_http::Response::from_string(body)
        .with_status_code(200)
        .with_header(
            tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..])
                .unwrap(),
        )
}

fn redirect(location: &str) -> Response {
    tiny_http::Response::from_string("")
        .with_status_code(302)
        .with_header(tiny_http::Header::from_bytes(&b"Location"[..], location.as_bytes()).unwrap())
}

fn status(code: u16) -> Response {
    tiny_http::Response::from_string(format!("status {code}")).with_status_code(code)
}

fn session_value(cookie: Option<&str>) -> Option<String> {
    cookie?
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

fn login_page(state: &PortalState, error: bool) -> String {
    let meta = state
        .csrf_token
        .as_deref()
        .map(|token| format!(r#"<meta name="csrf-token" content="{token}">"#))
        .unwrap_or_default();
    let banner = if error {
        format!(r#"<div class="alert alert-danger">{LOGIN_ERROR}</div>"#)
    } else {
        String::new()
    };
    format!(
        r#"<html><head>{meta}</head><body>{banner}
        <form method="post" action="/logins/do">
            <input name="username"><input type="password" name="password">
        </form></body></html>"#
    )
}

fn route(state: &mut PortalState, request: &RecordedRequest) -> Response {
    let path = request.url.split('?').next().unwrap_or_default();
    match (request.method.as_str(), path) {
        ("GET", "/logins") => html(&login_page(state, request.url.contains("error=1"))),
        ("POST", "/logins/do") => {
            let form: HashMap<String, String> =
                url::form_urlencoded::parse(request.body.as_bytes())
                    .into_owned()
                    .collect();
            let credentials_ok = form.get("username").map(String::as_str) == Some(USERNAME)
                && form.get("password").map(String::as_str) == Some(PASSWORD);
            let token_ok = state
                .csrf_token
                .as_deref()
                .is_none_or(|token| form.get("_token").map(String::as_str) == Some(token));
            if !(credentials_ok && token_ok) {
                return redirect("/logins?error=1");
            }
            state.issued += 1;
            let value = format!("issued-{}", state.issued);
            state.valid_sessions.insert(value.clone());
            redirect("/authors").with_header(
                tiny_http::Header::from_bytes(
                    &b"Set-Cookie"[..],
                    format!("{SESSION_COOKIE}={value}; Path=/").as_bytes(),
                )
                .unwrap(),
            )
        }
        ("GET", "/authors") => match session_value(request.cookie.as_deref()) {
            Some(value) if state.valid_sessions.contains(&value) => {
                html("<html><body><h1>Authors</h1></body></html>")
            }
            _ => redirect("/logins"),
        },
        ("GET", _) if state.failing.contains(&request.url) => status(500),
        ("GET", _) => match state.pages.get(&request.url) {
            Some(body) => html(body),
            None => status(404),
        },
        _ => status(405),
    }
}

pub fn persisted_state(cookie_value: &str) -> SessionState {
    SessionState {
        cookies: [(SESSION_COOKIE.to_string(), cookie_value.to_string())].into(),
        headers: Default::default(),
    }
}

pub fn book_item(title: &str) -> String {
    format!(
        r##"<div class="ar-list-item">
            <div class="ar-title"><a href="#!">{title}</a></div>
            <div class="ar-meta">
                <a href="#!" class="ar-pub">Deepublish</a>
                <a href="#!">Budi Santoso</a>
                <a href="#!">Ani Wijaya</a>
            </div>
            <div class="ar-meta">
                <a href="#!" class="ar-year">2021</a>
                <a href="#!" class="ar-cited">Bandung</a>
                <a href="#!" class="ar-quartile">ISBN : 978-0-00-000000-0</a>
                <a href="#">Category : Buku Ajar</a>
            </div>
        </div>"##
    )
}

/// A book item with no title block.
pub fn malformed_book_item() -> String {
    book_item("x").replace(r##"<div class="ar-title"><a href="#!">x</a></div>"##, "")
}

pub fn listing(items: &[String], indicator: Option<&str>) -> String {
    let pagination = indicator
        .map(|text| format!(r#"<div class="pagination-text"><small>{text}</small></div>"#))
        .unwrap_or_default();
    format!(
        "<html><body><div class=\"ar-list\">{}</div>{pagination}</body></html>",
        items.concat()
    )
}

pub fn profile_page(name: &str) -> String {
    format!(r##"<html><body><div class="col-lg col-md"><h3><a href="#">{name}</a></h3></div></body></html>"##)
}
