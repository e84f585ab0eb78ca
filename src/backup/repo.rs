//! 仓库地址解析
//!
//! 支持格式: `https://github.com/owner/repo`、`http://github.com/owner/repo` 或 `owner/repo`

use crate::backup::error::{SyncError, SyncResult};
use std::fmt;

const GITHUB_PREFIXES: [&str; 2] = ["https://github.com/", "http://github.com/"];

/// 解析后的仓库引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
}

impl RepositoryRef {
    /// 解析用户配置的仓库地址
    pub fn parse(raw: &str) -> SyncResult<Self> {
        // 至多去掉一个前缀
        let stripped = GITHUB_PREFIXES
            .iter()
            .find_map(|prefix| raw.strip_prefix(prefix))
            .unwrap_or(raw)
            .trim_matches('/');

        let parts: Vec<&str> = stripped.split('/').collect();
        match parts.as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(SyncError::InvalidRepoFormat {
                raw: raw.to_string(),
            }),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
