//! In-process Gerrit stand-in.
//!
//! Serves a handful of changes and projects with Gerrit's `)]}'` prefix and
//! records every request it receives so tests can assert on the wire format.

#![allow(dead_code)]

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const REVISION_101: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const REVISION_102: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is not json")
    }

    /// Query pairs in order, decoded.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        url::form_urlencoded::parse(self.query.as_deref().unwrap_or_default().as_bytes())
            .into_owned()
            .collect()
    }
}

#[derive(Debug)]
pub struct Gerrit {
    pub requests: Vec<Recorded>,
    /// Current revision of change 101; tests bump it to simulate a new upload.
    pub revision_101: String,
    pub topic_101: Option<String>,
}

pub type Db = Arc<Mutex<Gerrit>>;

pub struct MockGerrit {
    pub addr: SocketAddr,
    pub db: Db,
}

impl MockGerrit {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.db.lock().unwrap().requests.clone()
    }

    pub fn last_request(&self) -> Recorded {
        self.requests().last().cloned().expect("no request recorded")
    }

    pub fn set_revision_101(&self, revision: &str) {
        self.db.lock().unwrap().revision_101 = revision.to_owned();
    }
}

pub fn start() -> MockGerrit {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    let db: Db = Arc::new(Mutex::new(Gerrit {
        requests: Vec::new(),
        revision_101: REVISION_101.to_owned(),
        topic_101: Some("feature-x".to_owned()),
    }));
    let app = Router::new().fallback(handle).with_state(db.clone());

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, app).await
        })
        .unwrap();
    });

    MockGerrit { addr, db }
}

fn gerrit_json(status: StatusCode, value: Value) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json; charset=UTF-8")],
        format!(")]}}'\n{value}"),
    )
        .into_response()
}

fn text(status: StatusCode, body: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=UTF-8")],
        body.to_owned(),
    )
        .into_response()
}

pub fn change(number: u64, revision: &str, topic: Option<&str>) -> Value {
    let mut change = json!({
        "id": format!("demo~master~I{number:040}"),
        "project": "demo",
        "branch": "master",
        "change_id": format!("I{number:040}"),
        "subject": format!("Change {number}"),
        "status": "NEW",
        "updated": "2024-03-01 10:00:00.000000000",
        "mergeable": true,
        "_number": number,
        "current_revision": revision,
        "revisions": {
            revision: {
                "_number": 1,
                "ref": format!("refs/changes/{:02}/{number}/1", number % 100),
                "files": {
                    "src/lib.rs": {"lines_inserted": 3, "lines_deleted": 1},
                    "src/main.rs": {"lines_inserted": 1},
                    "README.md": {"status": "A", "lines_inserted": 10},
                },
            },
        },
    });

    if let Some(topic) = topic {
        change["topic"] = json!(topic);
    }

    change
}

async fn handle(State(db): State<Db>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let body = String::from_utf8_lossy(&body).into_owned();
    let mut gerrit = db.lock().unwrap();

    gerrit.requests.push(Recorded {
        method: method.to_string(),
        path: uri.path().to_owned(),
        query: uri.query().map(ToOwned::to_owned),
        headers: headers.clone(),
        body: body.clone(),
    });

    let path = uri.path();
    let authenticated = path.starts_with("/a/");
    let path = path.strip_prefix("/a").unwrap_or(path);
    let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

    if authenticated && !headers.contains_key(header::AUTHORIZATION) {
        return text(StatusCode::UNAUTHORIZED, "Unauthorized");
    }

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["changes"]) => {
            let query: Vec<(String, String)> = url::form_urlencoded::parse(uri.query().unwrap_or_default().as_bytes())
                .into_owned()
                .collect();
            let q = query
                .iter()
                .find(|(k, _)| k == "q")
                .map(|(_, v)| v.as_str())
                .unwrap_or_default();

            let all = vec![
                change(101, &gerrit.revision_101, gerrit.topic_101.as_deref()),
                change(102, REVISION_102, None),
            ];

            let changes: Vec<Value> = match q.split_once("change:") {
                Some((_, id)) => {
                    let id = id.split(' ').next().unwrap_or_default();
                    all.into_iter()
                        .filter(|c| c["_number"].to_string() == id || c["change_id"] == id)
                        .collect()
                }
                None => all,
            };

            gerrit_json(StatusCode::OK, Value::Array(changes))
        }
        ("POST", ["changes"]) => {
            let input: Value = serde_json::from_str(&body).unwrap_or_default();
            let mut created = json!({
                "_number": 103,
                "id": format!("{}~{}~I{:040}", input["project"].as_str().unwrap_or_default(), input["branch"].as_str().unwrap_or_default(), 103),
                "change_id": format!("I{:040}", 103),
                "status": "NEW",
            });
            for key in ["project", "branch", "subject", "topic"] {
                if let Some(value) = input.get(key) {
                    created[key] = value.clone();
                }
            }

            gerrit_json(StatusCode::CREATED, created)
        }
        ("GET", ["changes", "101", "topic"]) => match gerrit.topic_101.clone() {
            Some(topic) => gerrit_json(StatusCode::OK, json!(topic)),
            None => (StatusCode::NO_CONTENT, "").into_response(),
        },
        ("PUT", ["changes", "101", "topic"]) => {
            let input: Value = serde_json::from_str(&body).unwrap_or_default();
            let topic = input["topic"].as_str().map(ToOwned::to_owned);
            gerrit.topic_101 = topic.clone();

            gerrit_json(StatusCode::OK, json!(topic))
        }
        ("DELETE", ["changes", "101", "topic"]) => {
            gerrit.topic_101 = None;

            (StatusCode::NO_CONTENT, "").into_response()
        }
        ("POST", ["changes", "101", "abandon"]) => {
            let mut abandoned = change(101, &gerrit.revision_101, None);
            abandoned["status"] = json!("ABANDONED");

            gerrit_json(StatusCode::OK, abandoned)
        }
        ("POST", ["changes", "101", "rebase"]) => gerrit_json(StatusCode::OK, change(101, &gerrit.revision_101, None)),
        ("POST", ["changes", "102", "submit"]) => {
            text(StatusCode::CONFLICT, "change 102: needs Code-Review")
        }
        ("PUT" | "DELETE", ["changes", "101", "edit", ..])
        | ("POST", ["changes", "101", "edit:publish" | "publish"]) => (StatusCode::NO_CONTENT, "").into_response(),
        ("POST", ["changes", "101", "reviewers"]) => {
            let input: Value = serde_json::from_str(&body).unwrap_or_default();

            gerrit_json(
                StatusCode::OK,
                json!({"input": input["reviewer"], "reviewers": [{"_account_id": 1000096, "name": "Jane Roe"}]}),
            )
        }
        ("POST", ["changes", _, "revisions", _, "review"]) => {
            let input: Value = serde_json::from_str(&body).unwrap_or_default();

            gerrit_json(StatusCode::OK, json!({"labels": input.get("labels").cloned().unwrap_or(json!({}))}))
        }
        ("GET", ["changes", _, "revisions", _, "files", file, "content"]) => {
            let file = url::form_urlencoded::parse(format!("f={file}").as_bytes())
                .next()
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();

            text(StatusCode::OK, &format!("  base64:{file}\n"))
        }
        ("GET", ["projects", name]) => {
            let name = url::form_urlencoded::parse(format!("n={name}").as_bytes())
                .next()
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();

            if name == "missing" {
                return gerrit_json(StatusCode::NOT_FOUND, json!({"message": "Not found: missing"}));
            }

            gerrit_json(
                StatusCode::OK,
                json!({
                    "id": url::form_urlencoded::byte_serialize(name.as_bytes()).collect::<String>(),
                    "name": name,
                    "parent": "All-Projects",
                    "description": "Demo project",
                    "state": "ACTIVE",
                    "web_links": [{"name": "browse", "url": "https://git.example.com/demo"}],
                }),
            )
        }
        ("GET", ["projects", name, "branches", branch, "files", file, "content"]) => {
            text(StatusCode::OK, &format!("{name}|{branch}|{file}"))
        }
        ("GET", ["broken"]) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            ")]}'\n{\"oops\": ",
        )
            .into_response(),
        ("GET", ["echo"]) => gerrit_json(
            StatusCode::OK,
            json!({"accept": headers.get(header::ACCEPT).and_then(|v| v.to_str().ok())}),
        ),
        _ => text(StatusCode::NOT_FOUND, "Not Found"),
    }
}
