//! 测试用的内存版 GitHub 内容 API

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 收到的一次请求
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub message: Option<String>,
}

#[derive(Default)]
struct Inner {
    /// path -> (sha, 原始内容)
    files: HashMap<String, (String, Vec<u8>)>,
    /// path -> 原样返回的 200 响应体（目录列表等非文件响应）
    raw: HashMap<String, Value>,
    requests: Vec<RecordedRequest>,
    next_sha: u64,
}

#[derive(Clone, Default)]
pub(crate) struct FakeGitHub {
    inner: Arc<Mutex<Inner>>,
    addr: Arc<Mutex<Option<std::net::SocketAddr>>>,
}

impl FakeGitHub {
    pub async fn start() -> Self {
        let fake = FakeGitHub::default();
        let app = Router::new()
            .route(
                "/repos/:owner/:repo/contents/*path",
                get(get_contents).put(put_contents),
            )
            .with_state(fake.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        *fake.addr.lock().unwrap() = Some(listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        fake
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr.lock().unwrap().unwrap())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    /// 直接放入一个文件（模拟仓库中已有的备份）
    pub fn seed(&self, path: &str, content: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.next_sha += 1;
        let sha = format!("seed{}", inner.next_sha);
        inner.files.insert(path.to_string(), (sha, content.to_vec()));
    }

    /// 对该路径的 GET 原样返回指定 JSON
    pub fn seed_raw(&self, path: &str, body: Value) {
        let mut inner = self.inner.lock().unwrap();
        inner.raw.insert(path.to_string(), body);
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.files.get(path).map(|(_, content)| content.clone())
    }

    fn record(&self, method: &'static str, path: &str, headers: &HeaderMap, message: Option<String>) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.inner.lock().unwrap().requests.push(RecordedRequest {
            method,
            path: path.to_string(),
            authorization: header("authorization"),
            accept: header("accept"),
            message,
        });
    }
}

async fn get_contents(
    State(fake): State<FakeGitHub>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    fake.record("GET", &path, &headers, None);
    let inner = fake.inner.lock().unwrap();
    if let Some(body) = inner.raw.get(&path) {
        return Json(body.clone()).into_response();
    }
    match inner.files.get(&path) {
        Some((sha, content)) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(content);
            // 与真实 API 一样每 60 个字符换行
            let wrapped = encoded
                .as_bytes()
                .chunks(60)
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
                .collect::<Vec<_>>()
                .join("\n");
            Json(json!({"path": path, "sha": sha, "encoding": "base64", "content": wrapped}))
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, Json(json!({"message": "Not Found"}))).into_response(),
    }
}

async fn put_contents(
    State(fake): State<FakeGitHub>,
    Path((_owner, _repo, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let message = body["message"].as_str().map(str::to_string);
    fake.record("PUT", &path, &headers, message);

    let content = match body["content"]
        .as_str()
        .and_then(|c| base64::engine::general_purpose::STANDARD.decode(c).ok())
    {
        Some(content) => content,
        None => {
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({"message": "bad content"})))
                .into_response()
        }
    };

    let mut inner = fake.inner.lock().unwrap();
    let existing_sha = inner.files.get(&path).map(|(sha, _)| sha.clone());
    match (existing_sha, body["sha"].as_str()) {
        (Some(_), None) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({"message": "Invalid request. \"sha\" wasn't supplied."})),
            )
                .into_response()
        }
        (Some(current), Some(sent)) if current != sent => {
            return (
                StatusCode::CONFLICT,
                Json(json!({"message": format!("{} does not match {}", path, sent)})),
            )
                .into_response()
        }
        _ => {}
    }

    let created = !inner.files.contains_key(&path);
    inner.next_sha += 1;
    let sha = format!("sha{}", inner.next_sha);
    inner.files.insert(path.clone(), (sha.clone(), content));

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(json!({"content": {"path": path, "sha": sha}}))).into_response()
}
