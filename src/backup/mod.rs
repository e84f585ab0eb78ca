//! GitHub 备份同步模块
//!
//! 将令牌、渠道、模型三张配置表以 JSON 文件形式推送到 GitHub 仓库，
//! 并支持按需从仓库拉取恢复。

pub mod codec;
pub mod dao;
pub mod db;
pub mod error;
pub mod github;
pub mod handler;
pub mod models;
pub mod options;
pub mod remote;
pub mod repo;
pub mod service;
pub mod types;

pub use error::SyncError;
pub use handler::GitHubSyncHandler;
pub use options::{OptionMap, OptionStore, SyncConfig};
pub use remote::RemoteFileStore;
pub use repo::RepositoryRef;
pub use service::{BackupSyncer, RestoreReport, SyncReport};
