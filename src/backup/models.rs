//! 备份实体定义
//!
//! 每种实体对应一张表和仓库中的一个固定文件，JSON 字段名即列名。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

/// 写入数据库时使用的列值
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(v.clone())
    }
}

/// 一列的名称和值
///
/// `nullable` 的列对应可空字段：`None` 时不参与部分更新，`Some` 时即使是零值也会写入。
/// 非空列只有非零值才参与部分更新。
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub value: SqlValue,
    pub nullable: bool,
}

impl Column {
    pub fn new(name: &'static str, value: impl Into<SqlValue>) -> Self {
        Self {
            name,
            value: value.into(),
            nullable: false,
        }
    }

    pub fn nullable<T: Into<SqlValue>>(name: &'static str, value: Option<T>) -> Self {
        Self {
            name,
            value: value.map(Into::into).unwrap_or(SqlValue::Null),
            nullable: true,
        }
    }

    /// 部分更新时是否写入该列
    pub fn is_update_candidate(&self) -> bool {
        if self.nullable {
            return !matches!(self.value, SqlValue::Null);
        }
        match &self.value {
            SqlValue::Integer(v) => *v != 0,
            SqlValue::Real(v) => *v != 0.0,
            SqlValue::Text(v) => !v.is_empty(),
            SqlValue::Bool(v) => *v,
            SqlValue::Null => false,
        }
    }
}

/// 敏感字段：推送时清空，恢复时沿用本地已有的值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectedField {
    Key,
}

/// 可备份实体
pub trait BackupRecord:
    Serialize
    + DeserializeOwned
    + for<'r> FromRow<'r, SqliteRow>
    + Clone
    + Send
    + Sync
    + Unpin
    + 'static
{
    /// 实体名，用于日志和错误信息
    const ENTITY: &'static str;
    /// 数据库表名
    const TABLE: &'static str;
    /// 仓库中的文件路径
    const FILE_PATH: &'static str;
    /// 受保护的字段表
    const PROTECTED_FIELDS: &'static [ProtectedField];

    fn id(&self) -> i64;

    /// 除 id 以外的全部列
    fn columns(&self) -> Vec<Column>;

    fn protected_value(&self, _field: ProtectedField) -> Option<&str> {
        None
    }

    fn set_protected_value(&mut self, _field: ProtectedField, _value: String) {}
}

/// 令牌
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Token {
    pub id: i64,
    pub user_id: i64,
    pub key: String,
    pub status: i64,
    pub name: String,
    pub created_time: i64,
    pub accessed_time: i64,
    pub expired_time: i64,
    pub remain_quota: i64,
    pub unlimited_quota: bool,
    pub model_limits_enabled: bool,
    pub model_limits: String,
    pub allow_ips: Option<String>,
    pub used_quota: i64,
    pub group: String,
}

impl BackupRecord for Token {
    const ENTITY: &'static str = "Token";
    const TABLE: &'static str = "tokens";
    const FILE_PATH: &'static str = "tokens.json";
    const PROTECTED_FIELDS: &'static [ProtectedField] = &[ProtectedField::Key];

    fn id(&self) -> i64 {
        self.id
    }

    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("user_id", self.user_id),
            Column::new("key", &self.key),
            Column::new("status", self.status),
            Column::new("name", &self.name),
            Column::new("created_time", self.created_time),
            Column::new("accessed_time", self.accessed_time),
            Column::new("expired_time", self.expired_time),
            Column::new("remain_quota", self.remain_quota),
            Column::new("unlimited_quota", self.unlimited_quota),
            Column::new("model_limits_enabled", self.model_limits_enabled),
            Column::new("model_limits", &self.model_limits),
            Column::nullable("allow_ips", self.allow_ips.as_ref()),
            Column::new("used_quota", self.used_quota),
            Column::new("group", &self.group),
        ]
    }

    fn protected_value(&self, field: ProtectedField) -> Option<&str> {
        match field {
            ProtectedField::Key => Some(&self.key),
        }
    }

    fn set_protected_value(&mut self, field: ProtectedField, value: String) {
        match field {
            ProtectedField::Key => self.key = value,
        }
    }
}

/// 渠道
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Channel {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub channel_type: i64,
    pub key: String,
    pub openai_organization: Option<String>,
    pub test_model: Option<String>,
    pub status: i64,
    pub name: String,
    pub weight: Option<i64>,
    pub created_time: i64,
    pub test_time: i64,
    pub response_time: i64,
    pub base_url: Option<String>,
    pub other: String,
    pub balance: f64,
    pub balance_updated_time: i64,
    pub models: String,
    pub group: String,
    pub used_quota: i64,
    pub model_mapping: Option<String>,
    pub status_code_mapping: Option<String>,
    pub priority: Option<i64>,
    pub auto_ban: Option<i64>,
    pub other_info: String,
    pub tag: Option<String>,
    pub setting: Option<String>,
}

impl BackupRecord for Channel {
    const ENTITY: &'static str = "Channel";
    const TABLE: &'static str = "channels";
    const FILE_PATH: &'static str = "channels.json";
    const PROTECTED_FIELDS: &'static [ProtectedField] = &[ProtectedField::Key];

    fn id(&self) -> i64 {
        self.id
    }

    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("type", self.channel_type),
            Column::new("key", &self.key),
            Column::nullable("openai_organization", self.openai_organization.as_ref()),
            Column::nullable("test_model", self.test_model.as_ref()),
            Column::new("status", self.status),
            Column::new("name", &self.name),
            Column::nullable("weight", self.weight),
            Column::new("created_time", self.created_time),
            Column::new("test_time", self.test_time),
            Column::new("response_time", self.response_time),
            Column::nullable("base_url", self.base_url.as_ref()),
            Column::new("other", &self.other),
            Column::new("balance", self.balance),
            Column::new("balance_updated_time", self.balance_updated_time),
            Column::new("models", &self.models),
            Column::new("group", &self.group),
            Column::new("used_quota", self.used_quota),
            Column::nullable("model_mapping", self.model_mapping.as_ref()),
            Column::nullable("status_code_mapping", self.status_code_mapping.as_ref()),
            Column::nullable("priority", self.priority),
            Column::nullable("auto_ban", self.auto_ban),
            Column::new("other_info", &self.other_info),
            Column::nullable("tag", self.tag.as_ref()),
            Column::nullable("setting", self.setting.as_ref()),
        ]
    }

    fn protected_value(&self, field: ProtectedField) -> Option<&str> {
        match field {
            ProtectedField::Key => Some(&self.key),
        }
    }

    fn set_protected_value(&mut self, field: ProtectedField, value: String) {
        match field {
            ProtectedField::Key => self.key = value,
        }
    }
}

/// 模型元数据（没有敏感字段）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct ModelMeta {
    pub id: i64,
    pub model_name: String,
    pub description: String,
    pub icon: String,
    pub tags: String,
    pub vendor_id: i64,
    pub endpoints: String,
    pub status: i64,
    pub sync_official: i64,
    pub created_time: i64,
    pub updated_time: i64,
    pub name_rule: i64,
}

impl BackupRecord for ModelMeta {
    const ENTITY: &'static str = "Model";
    const TABLE: &'static str = "models";
    const FILE_PATH: &'static str = "models.json";
    const PROTECTED_FIELDS: &'static [ProtectedField] = &[];

    fn id(&self) -> i64 {
        self.id
    }

    fn columns(&self) -> Vec<Column> {
        vec![
            Column::new("model_name", &self.model_name),
            Column::new("description", &self.description),
            Column::new("icon", &self.icon),
            Column::new("tags", &self.tags),
            Column::new("vendor_id", self.vendor_id),
            Column::new("endpoints", &self.endpoints),
            Column::new("status", self.status),
            Column::new("sync_official", self.sync_official),
            Column::new("created_time", self.created_time),
            Column::new("updated_time", self.updated_time),
            Column::new("name_rule", self.name_rule),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_update_skips_zero_values() {
        let token = Token {
            id: 3,
            name: "ci".to_string(),
            remain_quota: 0,
            unlimited_quota: false,
            allow_ips: Some(String::new()),
            ..Default::default()
        };

        let candidates: Vec<&str> = token
            .columns()
            .iter()
            .filter(|c| c.is_update_candidate())
            .map(|c| c.name)
            .collect();

        // 可空字段只要存在就写入，哪怕是空串
        assert_eq!(candidates, vec!["name", "allow_ips"]);
    }

    #[test]
    fn channel_type_uses_wire_name() {
        let channel = Channel {
            id: 1,
            channel_type: 14,
            ..Default::default()
        };
        let json = serde_json::to_value(&channel).unwrap();
        assert_eq!(json["type"], 14);
        assert!(json.get("channel_type").is_none());
        assert!(json["base_url"].is_null());
    }

    #[test]
    fn protected_field_tables() {
        assert_eq!(Token::PROTECTED_FIELDS, &[ProtectedField::Key]);
        assert_eq!(Channel::PROTECTED_FIELDS, &[ProtectedField::Key]);
        assert!(ModelMeta::PROTECTED_FIELDS.is_empty());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let model: ModelMeta = serde_json::from_str(r#"{"id": 9, "model_name": "gpt-4o"}"#).unwrap();
        assert_eq!(model.id, 9);
        assert_eq!(model.model_name, "gpt-4o");
        assert_eq!(model.status, 0);
    }
}
