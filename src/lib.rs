pub mod backup;

// 重新导出常用类型，方便外部使用
pub use backup::{
    error::SyncError,
    github::GitHubContentsClient,
    handler::GitHubSyncHandler,
    options::{OptionMap, OptionStore, SyncConfig},
    repo::RepositoryRef,
    service::{BackupSyncer, RestoreReport, SyncReport},
};
