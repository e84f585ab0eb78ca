//! 实体编解码：脱敏、序列化为缩进 JSON、从备份文件反序列化

use crate::backup::error::{SyncError, SyncResult};
use crate::backup::models::BackupRecord;

/// 复制一份记录并清空其中的受保护字段，不修改原始数据
pub fn redact_for_export<R: BackupRecord>(rows: &[R]) -> Vec<R> {
    rows.iter()
        .cloned()
        .map(|mut row| {
            for field in R::PROTECTED_FIELDS {
                row.set_protected_value(*field, String::new());
            }
            row
        })
        .collect()
}

/// 把本地已有记录的受保护字段拷贝到待写入的记录上
pub fn carry_forward_protected<R: BackupRecord>(incoming: &mut R, existing: &R) {
    for field in R::PROTECTED_FIELDS {
        let value = existing.protected_value(*field).unwrap_or_default();
        incoming.set_protected_value(*field, value.to_string());
    }
}

/// 序列化为两空格缩进的 JSON 数组，保持查询顺序
pub fn serialize<R: BackupRecord>(rows: &[R]) -> SyncResult<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(rows)?)
}

pub fn deserialize<R: BackupRecord>(bytes: &[u8]) -> SyncResult<Vec<R>> {
    serde_json::from_slice(bytes).map_err(|cause| SyncError::MalformedBackup {
        entity: R::ENTITY,
        cause,
    })
}
