//! 同步错误类型

use reqwest::StatusCode;

/// GitHub 备份同步过程中可能出现的错误
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// 仓库地址无法解析为 `owner/repo`
    #[error("无效的仓库地址格式，应为: owner/repo（实际: {raw}）")]
    InvalidRepoFormat { raw: String },

    /// 下载文件时远端返回非 200
    #[error("GitHub API 错误 ({status}): 文件 {path} 不存在或无法访问")]
    RemoteFetchFailed { status: StatusCode, path: String },

    /// 上传文件时远端返回 200/201 以外的状态
    #[error("GitHub API 错误 ({status}): {body}")]
    RemoteWriteFailed { status: StatusCode, body: String },

    /// 响应中没有字符串类型的 content 字段
    #[error("无法获取文件内容: {path}")]
    MissingContent { path: String },

    #[error("Base64 解码失败: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// 备份文件不是合法的 JSON 数组
    #[error("解析 {entity} 备份失败: {cause}")]
    MalformedBackup {
        entity: &'static str,
        cause: serde_json::Error,
    },

    /// token 含有无法放入请求头的字符
    #[error("无效的 GitHub Token")]
    InvalidToken,

    #[error("请求 {path} 超时")]
    Timeout { path: String },

    #[error("HTTP 请求失败: {0}")]
    Http(#[from] reqwest::Error),

    #[error("序列化失败: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] sqlx::Error),

    /// 推送某一类实体时失败
    #[error("sync {entity} failed: {source}")]
    Push {
        entity: &'static str,
        #[source]
        source: Box<SyncError>,
    },

    /// 恢复某一类实体时失败
    #[error("restore {entity} failed: {source}")]
    Pull {
        entity: &'static str,
        #[source]
        source: Box<SyncError>,
    },
}

impl SyncError {
    /// 把 reqwest 错误映射为同步错误，超时单独区分
    pub(crate) fn from_transport(err: reqwest::Error, path: &str) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                path: path.to_string(),
            }
        } else {
            Self::Http(err)
        }
    }

    /// 出错的实体类型（仅编排层包装后的错误才有）
    pub fn entity(&self) -> Option<&'static str> {
        match self {
            Self::Push { entity, .. }
            | Self::Pull { entity, .. }
            | Self::MalformedBackup { entity, .. } => Some(*entity),
            _ => None,
        }
    }
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
