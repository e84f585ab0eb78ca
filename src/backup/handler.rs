//! GitHub 同步接口：查询状态、触发推送、触发恢复
//!
//! 路由层只需把这里的返回值序列化为 JSON，并始终以 HTTP 200 响应。

use crate::backup::error::SyncResult;
use crate::backup::github::{GitHubContentsClient, DEFAULT_API_BASE_URL};
use crate::backup::options::{OptionStore, SyncConfig, GITHUB_SYNC_LAST_TIME};
use crate::backup::repo::RepositoryRef;
use crate::backup::service::{BackupSyncer, RestoreReport};
use crate::backup::types::{ApiResponse, SyncStatus};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{info, warn};

const NOT_CONFIGURED: &str = "GitHub 同步未配置，请先配置 GitHub Token 和仓库地址";

pub struct GitHubSyncHandler {
    options: Arc<dyn OptionStore>,
    syncer: BackupSyncer,
    api_base_url: String,
}

impl GitHubSyncHandler {
    pub fn new(options: Arc<dyn OptionStore>, db: Pool<Sqlite>) -> Self {
        Self::with_syncer(options, BackupSyncer::new(db))
    }

    pub fn with_syncer(options: Arc<dyn OptionStore>, syncer: BackupSyncer) -> Self {
        Self {
            options,
            syncer,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    /// 指定 API 地址（GitHub Enterprise 或测试服务）
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn get_status(&self) -> ApiResponse<SyncStatus> {
        let config = SyncConfig::from_options(self.options.as_ref());
        ApiResponse::ok(SyncStatus {
            enabled: config.enabled(),
            last_sync_time: config.last_sync_time,
        })
    }

    /// 手动触发推送
    pub async fn trigger_sync(&self) -> ApiResponse<()> {
        let config = SyncConfig::from_options(self.options.as_ref());
        if !config.enabled() {
            return ApiResponse::fail(NOT_CONFIGURED);
        }

        let result = match self.remote_for(&config) {
            Ok(remote) => self.syncer.sync_all(&remote).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(report) => {
                self.mark_synced().await;
                info!(
                    "[GitHubSyncHandler] 推送成功，共 {} 条记录",
                    report.total_rows()
                );
                ApiResponse::ok_message("同步成功")
            }
            Err(e) => ApiResponse::fail(format!("同步失败: {}", e)),
        }
    }

    /// 手动触发恢复
    pub async fn trigger_restore(&self) -> ApiResponse<()> {
        let config = SyncConfig::from_options(self.options.as_ref());
        if !config.enabled() {
            return ApiResponse::fail(NOT_CONFIGURED);
        }

        let result = match self.remote_for(&config) {
            Ok(remote) => self.syncer.restore_all(&remote).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(report) => {
                self.mark_synced().await;
                ApiResponse::ok_message(restore_message(&report))
            }
            Err(e) => ApiResponse::fail(format!("拉取失败: {}", e)),
        }
    }

    /// 每次调用都重新解析仓库地址
    fn remote_for(&self, config: &SyncConfig) -> SyncResult<GitHubContentsClient> {
        let repo = RepositoryRef::parse(&config.repo)?;
        GitHubContentsClient::with_base_url(&self.api_base_url, &config.token, repo)
    }

    async fn mark_synced(&self) {
        let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        if let Err(e) = self.options.update(GITHUB_SYNC_LAST_TIME, &now).await {
            warn!("[GitHubSyncHandler] 更新最后同步时间失败: {:?}", e);
        }
    }
}

fn restore_message(report: &RestoreReport) -> String {
    let mut message = "拉取成功，数据已恢复".to_string();

    let failures: Vec<String> = report
        .failures()
        .map(|f| format!("{}#{}: {}", f.entity, f.id, f.cause))
        .collect();
    if !failures.is_empty() {
        message.push_str(&format!(
            "；{} 条记录恢复失败（{}）",
            failures.len(),
            failures.join("; ")
        ));
    }

    let created = report.created_without_secrets();
    if created > 0 {
        message.push_str(&format!(
            "；新建的 {} 条令牌/渠道记录没有密钥，请手动设置",
            created
        ));
    }
    message
}
