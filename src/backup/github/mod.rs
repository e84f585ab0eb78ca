//! GitHub 内容 API 客户端

pub mod api;
pub mod types;

#[cfg(test)]
pub(crate) mod fake_server;

pub use api::{decode_base64_content, GitHubContentsClient, DEFAULT_API_BASE_URL};
pub use types::{PutContentsRequest, RemoteFile};
