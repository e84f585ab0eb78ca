//! 备份同步服务层
//!
//! 推送：按固定顺序（令牌、渠道、模型）读取整表、脱敏、序列化并上传。
//! 恢复：按同样顺序下载、解析，并按 id 逐条更新或插入，保留本地敏感字段。
//! 任一实体类型失败即中止后续步骤，整个过程不是事务性的。

use crate::backup::codec;
use crate::backup::dao::BackupDao;
use crate::backup::error::{SyncError, SyncResult};
use crate::backup::models::{BackupRecord, Channel, ModelMeta, Token};
use crate::backup::remote::RemoteFileStore;
use async_trait::async_trait;
use sqlx::{Pool, Sqlite};
use std::marker::PhantomData;
use tracing::{debug, error, info, warn};

/// 单条记录恢复失败
#[derive(Debug, Clone)]
pub struct RecordFailure {
    pub entity: &'static str,
    pub id: i64,
    pub cause: String,
}

/// 单个实体类型的恢复结果
#[derive(Debug, Clone)]
pub struct EntityRestore {
    pub entity: &'static str,
    /// 该实体是否有受保护字段（新建的行需要手动补齐）
    pub protects_secrets: bool,
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<RecordFailure>,
}

/// 推送结果：每个实体类型上传的行数
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub entities: Vec<(&'static str, usize)>,
}

impl SyncReport {
    pub fn total_rows(&self) -> usize {
        self.entities.iter().map(|(_, rows)| rows).sum()
    }
}

/// 恢复结果
#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    pub entities: Vec<EntityRestore>,
}

impl RestoreReport {
    pub fn failures(&self) -> impl Iterator<Item = &RecordFailure> {
        self.entities.iter().flat_map(|e| e.failures.iter())
    }

    /// 新建后缺少密钥、需要手动设置的行数
    pub fn created_without_secrets(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| e.protects_secrets)
            .map(|e| e.created)
            .sum()
    }
}

enum RecordOutcome {
    Created,
    Updated,
}

/// 一种实体的推送/恢复步骤
#[async_trait]
pub trait EntitySync: Send + Sync {
    fn entity(&self) -> &'static str;

    fn file_path(&self) -> &'static str;

    /// 推送，返回上传的行数
    async fn push(&self, db: &Pool<Sqlite>, remote: &dyn RemoteFileStore) -> SyncResult<usize>;

    async fn pull(&self, db: &Pool<Sqlite>, remote: &dyn RemoteFileStore)
        -> SyncResult<EntityRestore>;
}

/// 基于 [`BackupRecord`] 描述的通用步骤
pub struct RecordSync<R>(PhantomData<fn() -> R>);

impl<R: BackupRecord> RecordSync<R> {
    pub fn new() -> Self {
        Self(PhantomData)
    }

    async fn restore_record(dao: &BackupDao<R>, record: &mut R) -> SyncResult<RecordOutcome> {
        match dao.find_by_id(record.id()).await? {
            Some(existing) => {
                codec::carry_forward_protected(record, &existing);
                dao.update_partial(record.id(), record).await?;
                Ok(RecordOutcome::Updated)
            }
            None => {
                dao.create(record).await?;
                Ok(RecordOutcome::Created)
            }
        }
    }
}

impl<R: BackupRecord> Default for RecordSync<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: BackupRecord> EntitySync for RecordSync<R> {
    fn entity(&self) -> &'static str {
        R::ENTITY
    }

    fn file_path(&self) -> &'static str {
        R::FILE_PATH
    }

    async fn push(&self, db: &Pool<Sqlite>, remote: &dyn RemoteFileStore) -> SyncResult<usize> {
        let dao = BackupDao::<R>::new(db.clone());
        let rows = dao.find_all().await?;
        let data = codec::serialize(&codec::redact_for_export(&rows))?;

        // 先取当前 sha 再写入；两步之间 sha 可能过期，由远端拒绝
        let version = remote.current_version(R::FILE_PATH).await;
        remote.put(R::FILE_PATH, &data, version.as_deref()).await?;

        info!(
            "[BackupSync] ✅ {} 已推送到 {}，共 {} 条",
            R::ENTITY,
            R::FILE_PATH,
            rows.len()
        );
        Ok(rows.len())
    }

    async fn pull(
        &self,
        db: &Pool<Sqlite>,
        remote: &dyn RemoteFileStore,
    ) -> SyncResult<EntityRestore> {
        let data = remote.get(R::FILE_PATH).await?;
        let records: Vec<R> = codec::deserialize(&data)?;
        debug!("[BackupSync] {} 备份中共有 {} 条记录", R::ENTITY, records.len());

        let dao = BackupDao::<R>::new(db.clone());
        let mut outcome = EntityRestore {
            entity: R::ENTITY,
            protects_secrets: !R::PROTECTED_FIELDS.is_empty(),
            created: 0,
            updated: 0,
            failures: Vec::new(),
        };

        for mut record in records {
            let id = record.id();
            match Self::restore_record(&dao, &mut record).await {
                Ok(RecordOutcome::Updated) => outcome.updated += 1,
                Ok(RecordOutcome::Created) => {
                    if outcome.protects_secrets {
                        warn!(
                            "[BackupSync] 新建的 {} 记录 {} 没有密钥，需要手动设置",
                            R::ENTITY,
                            id
                        );
                    }
                    outcome.created += 1;
                }
                Err(e) => {
                    warn!("[BackupSync] 恢复 {} 记录 {} 失败，跳过: {}", R::ENTITY, id, e);
                    outcome.failures.push(RecordFailure {
                        entity: R::ENTITY,
                        id,
                        cause: e.to_string(),
                    });
                }
            }
        }

        info!(
            "[BackupSync] ✅ {} 恢复完成 - 更新: {}, 新增: {}, 失败: {}",
            R::ENTITY,
            outcome.updated,
            outcome.created,
            outcome.failures.len()
        );
        Ok(outcome)
    }
}

/// 默认的实体顺序：令牌、渠道、模型
pub fn default_entities() -> Vec<Box<dyn EntitySync>> {
    vec![
        Box::new(RecordSync::<Token>::new()),
        Box::new(RecordSync::<Channel>::new()),
        Box::new(RecordSync::<ModelMeta>::new()),
    ]
}

/// 备份同步器
pub struct BackupSyncer {
    db: Pool<Sqlite>,
    entities: Vec<Box<dyn EntitySync>>,
}

impl BackupSyncer {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self::with_entities(db, default_entities())
    }

    pub fn with_entities(db: Pool<Sqlite>, entities: Vec<Box<dyn EntitySync>>) -> Self {
        Self { db, entities }
    }

    /// 依次推送所有实体，遇到第一个失败立即中止
    pub async fn sync_all(&self, remote: &dyn RemoteFileStore) -> SyncResult<SyncReport> {
        info!("[BackupSync] 🔄 开始推送备份...");
        let mut report = SyncReport::default();

        for step in &self.entities {
            let rows = step.push(&self.db, remote).await.map_err(|source| {
                error!(
                    "[BackupSync] 推送 {}（{}）失败: {}",
                    step.entity(),
                    step.file_path(),
                    source
                );
                SyncError::Push {
                    entity: step.entity(),
                    source: Box::new(source),
                }
            })?;
            report.entities.push((step.entity(), rows));
        }

        info!("[BackupSync] ✅ 推送完成，共 {} 条记录", report.total_rows());
        Ok(report)
    }

    /// 依次恢复所有实体；文件下载或解析失败会中止，单条记录失败只记录
    pub async fn restore_all(&self, remote: &dyn RemoteFileStore) -> SyncResult<RestoreReport> {
        info!("[BackupSync] 🔄 开始从远端恢复...");
        let mut report = RestoreReport::default();

        for step in &self.entities {
            let outcome = step.pull(&self.db, remote).await.map_err(|source| {
                error!(
                    "[BackupSync] 恢复 {}（{}）失败: {}",
                    step.entity(),
                    step.file_path(),
                    source
                );
                SyncError::Pull {
                    entity: step.entity(),
                    source: Box::new(source),
                }
            })?;
            report.entities.push(outcome);
        }

        info!(
            "[BackupSync] ✅ 恢复完成，失败记录: {}",
            report.failures().count()
        );
        Ok(report)
    }
}
