//! GitHub 内容 API HTTP 客户端
//!
//! 对仓库中单个文件做读取和“先取 sha 再写入”的乐观并发更新。

use crate::backup::error::{SyncError, SyncResult};
use crate::backup::github::types::{PutContentsRequest, RemoteFile};
use crate::backup::remote::RemoteFileStore;
use crate::backup::repo::RepositoryRef;
use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com";

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = concat!("github-backup-sync/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 去掉换行后解码 base64（GitHub 返回的内容每 60 个字符折一行）
pub fn decode_base64_content(content: &str) -> SyncResult<Vec<u8>> {
    let cleaned: String = content.chars().filter(|c| *c != '\n' && *c != '\r').collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(cleaned)?)
}

/// 指向单个仓库的内容 API 客户端
pub struct GitHubContentsClient {
    client: reqwest::Client,
    api_base_url: String,
    repo: RepositoryRef,
}

impl GitHubContentsClient {
    /// 使用默认的 api.github.com
    pub fn new(token: &str, repo: RepositoryRef) -> SyncResult<Self> {
        Self::with_base_url(DEFAULT_API_BASE_URL, token, repo)
    }

    pub fn with_base_url(api_base_url: &str, token: &str, repo: RepositoryRef) -> SyncResult<Self> {
        Self::with_timeout(api_base_url, token, repo, REQUEST_TIMEOUT)
    }

    /// 认证信息通过 default_headers 自动添加到每个请求，超过 `timeout` 的请求返回 `Timeout`
    pub fn with_timeout(
        api_base_url: &str,
        token: &str,
        repo: RepositoryRef,
        timeout: Duration,
    ) -> SyncResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("token {}", token))
            .map_err(|_| SyncError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let client = reqwest::ClientBuilder::new()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            repo,
        })
    }

    fn contents_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base_url, self.repo.owner, self.repo.name, path
        )
    }

    /// 读取文件元数据和内容，非 200 视为失败
    pub async fn fetch(&self, path: &str) -> SyncResult<RemoteFile> {
        let url = self.contents_url(path);
        debug!("[GitHubApi] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::from_transport(e, path))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!("[GitHubApi] 文件 {} 读取失败，HTTP状态: {}", path, status);
            return Err(SyncError::RemoteFetchFailed {
                status,
                path: path.to_string(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| SyncError::from_transport(e, path))?;
        Ok(RemoteFile::from_value(path, &body))
    }

    /// 创建或更新文件，`sha` 为空表示新建
    pub async fn put(&self, path: &str, content: &[u8], sha: Option<&str>) -> SyncResult<()> {
        let url = self.contents_url(path);
        let payload = PutContentsRequest {
            message: format!(
                "Update {} - {}",
                path,
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
            content: base64::engine::general_purpose::STANDARD.encode(content),
            sha: sha.map(str::to_string),
        };

        info!(
            "[GitHubApi] 📤 上传 {} 到 {}（{} 字节，sha: {}）",
            path,
            self.repo,
            content.len(),
            sha.unwrap_or("-")
        );

        let response = self
            .client
            .put(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::from_transport(e, path))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            error!(
                "[GitHubApi] 上传 {} 失败，HTTP状态: {}, 响应: {}",
                path, status, body
            );
            return Err(SyncError::RemoteWriteFailed { status, body });
        }

        debug!("[GitHubApi] 上传 {} 成功，HTTP状态: {}", path, status);
        Ok(())
    }

    /// 下载并解码文件内容
    pub async fn get(&self, path: &str) -> SyncResult<Vec<u8>> {
        let file = self.fetch(path).await?;
        let content = file
            .content
            .ok_or(SyncError::MissingContent { path: file.path })?;
        let data = decode_base64_content(&content)?;
        info!("[GitHubApi] 📥 下载 {} 完成（{} 字节）", path, data.len());
        Ok(data)
    }
}

#[async_trait]
impl RemoteFileStore for GitHubContentsClient {
    async fn current_version(&self, path: &str) -> Option<String> {
        match self.fetch(path).await {
            Ok(file) => file.sha,
            Err(e) => {
                debug!("[GitHubApi] 文件 {} 当前不存在或不可读，按新建处理: {}", path, e);
                None
            }
        }
    }

    async fn put(&self, path: &str, content: &[u8], version: Option<&str>) -> SyncResult<()> {
        GitHubContentsClient::put(self, path, content, version).await
    }

    async fn get(&self, path: &str) -> SyncResult<Vec<u8>> {
        GitHubContentsClient::get(self, path).await
    }
}
