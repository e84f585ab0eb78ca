//! 备份实体数据访问层（DAO）
//!
//! 对三类实体提供统一的全量查询、按 id 查询、插入和部分更新，基于 sqlx。

use crate::backup::error::SyncResult;
use crate::backup::models::{BackupRecord, SqlValue};
use sqlx::query::Query;
use sqlx::sqlite::SqliteArguments;
use sqlx::{Pool, Sqlite};
use std::marker::PhantomData;
use tracing::debug;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_value(query: SqliteQuery<'_>, value: SqlValue) -> SqliteQuery<'_> {
    match value {
        SqlValue::Integer(v) => query.bind(v),
        SqlValue::Real(v) => query.bind(v),
        SqlValue::Text(v) => query.bind(v),
        SqlValue::Bool(v) => query.bind(v),
        SqlValue::Null => query.bind(None::<String>),
    }
}

fn quote(column: &str) -> String {
    format!("\"{}\"", column)
}

/// 单个实体类型的 DAO
pub struct BackupDao<R> {
    db: Pool<Sqlite>,
    _record: PhantomData<fn() -> R>,
}

impl<R: BackupRecord> BackupDao<R> {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }

    /// 查询整张表（不分页、不过滤）
    pub async fn find_all(&self) -> SyncResult<Vec<R>> {
        let sql = format!("SELECT * FROM {} ORDER BY id", R::TABLE);
        let rows = sqlx::query_as::<_, R>(&sql).fetch_all(&self.db).await?;
        debug!("[BackupDao] 查询 {} 全量数据，共 {} 条", R::ENTITY, rows.len());
        Ok(rows)
    }

    pub async fn find_by_id(&self, id: i64) -> SyncResult<Option<R>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", R::TABLE);
        let row = sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    /// 插入新记录，id 为 0 时由数据库分配，返回新行的 id
    pub async fn create(&self, record: &R) -> SyncResult<i64> {
        let mut names = Vec::new();
        let mut values = Vec::new();
        if record.id() != 0 {
            names.push(quote("id"));
            values.push(SqlValue::Integer(record.id()));
        }
        for column in record.columns() {
            names.push(quote(column.name));
            values.push(column.value);
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::TABLE,
            names.join(", "),
            vec!["?"; values.len()].join(", ")
        );
        let query = values.into_iter().fold(sqlx::query(&sql), bind_value);
        let result = query.execute(&self.db).await?;

        debug!(
            "[BackupDao] 新增 {} 记录，id: {}",
            R::ENTITY,
            result.last_insert_rowid()
        );
        Ok(result.last_insert_rowid())
    }

    /// 部分更新：只写入非零值和存在的可空字段，返回是否执行了更新
    pub async fn update_partial(&self, id: i64, record: &R) -> SyncResult<bool> {
        let columns: Vec<_> = record
            .columns()
            .into_iter()
            .filter(|c| c.is_update_candidate())
            .collect();
        if columns.is_empty() {
            debug!("[BackupDao] {} 记录 {} 没有需要更新的字段", R::ENTITY, id);
            return Ok(false);
        }

        let assignments: Vec<String> = columns
            .iter()
            .map(|c| format!("{} = ?", quote(c.name)))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?",
            R::TABLE,
            assignments.join(", ")
        );

        let query = columns
            .into_iter()
            .map(|c| c.value)
            .fold(sqlx::query(&sql), bind_value)
            .bind(id);
        query.execute(&self.db).await?;

        debug!("[BackupDao] 更新 {} 记录，id: {}", R::ENTITY, id);
        Ok(true)
    }
}
