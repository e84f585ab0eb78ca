//! 远端文件存储接口
//!
//! 编排层只依赖这个 trait，GitHub 内容 API 客户端是它的默认实现。

use crate::backup::error::SyncResult;
use async_trait::async_trait;

#[async_trait]
pub trait RemoteFileStore: Send + Sync {
    /// 读取文件当前的版本标识（sha），文件不存在或请求失败时返回 `None`
    async fn current_version(&self, path: &str) -> Option<String>;

    /// 创建或更新文件；更新已有文件时必须带上 `version`
    async fn put(&self, path: &str, content: &[u8], version: Option<&str>) -> SyncResult<()>;

    /// 下载文件内容，文件不存在时报错
    async fn get(&self, path: &str) -> SyncResult<Vec<u8>>;
}
