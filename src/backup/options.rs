//! 配置项存储
//!
//! 同步所需的 token、仓库地址和最后同步时间都来自进程级的键值配置，
//! 通过 [`OptionStore`] 注入，读写共用一把读写锁。

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{Pool, Row, Sqlite};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, info};

pub const GITHUB_SYNC_TOKEN: &str = "GitHubSyncToken";
pub const GITHUB_SYNC_REPO: &str = "GitHubSyncRepo";
pub const GITHUB_SYNC_LAST_TIME: &str = "GitHubSyncLastTime";

/// 配置键值存储接口
#[async_trait]
pub trait OptionStore: Send + Sync {
    /// 读取配置项，不存在时返回空字符串
    fn get(&self, key: &str) -> String;

    /// 在同一把读锁下读取多个配置项，按 `keys` 顺序返回
    fn snapshot(&self, keys: &[&str]) -> Vec<String>;

    /// 更新单个配置项
    async fn update(&self, key: &str, value: &str) -> Result<()>;
}

/// 基于读写锁的配置表，可选地持久化到 `options` 表
pub struct OptionMap {
    map: RwLock<HashMap<String, String>>,
    db: Option<Pool<Sqlite>>,
}

impl OptionMap {
    /// 纯内存配置（不持久化）
    pub fn in_memory() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
            db: None,
        }
    }

    /// 从数据库加载全部配置项
    pub async fn load(db: Pool<Sqlite>) -> Result<Self> {
        let rows = sqlx::query(r#"SELECT "key", value FROM options"#)
            .fetch_all(&db)
            .await
            .context("查询配置项失败")?;

        let map: HashMap<String, String> = rows
            .into_iter()
            .map(|row| (row.get("key"), row.get("value")))
            .collect();
        info!("[Options] 已加载 {} 个配置项", map.len());

        Ok(Self {
            map: RwLock::new(map),
            db: Some(db),
        })
    }
}

#[async_trait]
impl OptionStore for OptionMap {
    fn get(&self, key: &str) -> String {
        // 锁中毒时仍然读取已有数据
        let map = self.map.read().unwrap_or_else(|e| e.into_inner());
        map.get(key).cloned().unwrap_or_default()
    }

    fn snapshot(&self, keys: &[&str]) -> Vec<String> {
        let map = self.map.read().unwrap_or_else(|e| e.into_inner());
        keys.iter()
            .map(|key| map.get(*key).cloned().unwrap_or_default())
            .collect()
    }

    async fn update(&self, key: &str, value: &str) -> Result<()> {
        if let Some(db) = &self.db {
            sqlx::query(
                r#"
                INSERT INTO options ("key", value) VALUES (?, ?)
                ON CONFLICT("key") DO UPDATE SET value = excluded.value
                "#,
            )
            .bind(key)
            .bind(value)
            .execute(db)
            .await
            .with_context(|| format!("保存配置项 {} 失败", key))?;
        }

        let mut map = self.map.write().unwrap_or_else(|e| e.into_inner());
        map.insert(key.to_string(), value.to_string());
        debug!("[Options] 配置项已更新: {}", key);
        Ok(())
    }
}

/// GitHub 同步配置快照
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    pub token: String,
    pub repo: String,
    pub last_sync_time: String,
}

impl SyncConfig {
    /// 从配置存储中读取当前同步配置
    pub fn from_options(options: &dyn OptionStore) -> Self {
        let mut values = options
            .snapshot(&[GITHUB_SYNC_TOKEN, GITHUB_SYNC_REPO, GITHUB_SYNC_LAST_TIME])
            .into_iter();
        let mut next = || values.next().unwrap_or_default();
        Self {
            token: next(),
            repo: next(),
            last_sync_time: next(),
        }
    }

    /// token 和仓库地址都已配置时才启用同步
    pub fn enabled(&self) -> bool {
        !self.token.is_empty() && !self.repo.is_empty()
    }
}
