//! 转存去重缓存
//!
//! 源分享链接 → 已生成的新分享链接。这是"是否已处理过"的唯一依据，
//! 持久化在 SQLite 中，没有过期和淘汰。

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::provider::Provider;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS redistributions (
    source_url        TEXT PRIMARY KEY NOT NULL,
    redistributed_url TEXT NOT NULL,
    title             TEXT NOT NULL,
    provider          TEXT NOT NULL,
    created_at        TEXT NOT NULL
)
"#;

/// 一条转存记录
#[derive(Debug, Clone, PartialEq)]
pub struct RedistributionRecord {
    pub source_url: String,
    pub redistributed_url: String,
    pub title: String,
    pub provider: Provider,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct RedistributionCache {
    pool: Pool<Sqlite>,
}

impl RedistributionCache {
    /// 连接数据库，表不存在则创建
    pub async fn connect(database_url: &str) -> Result<Self, RelayError> {
        info!("🗄️ 连接缓存数据库: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(30));

        // SQLite 单写入者
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_TABLE).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// 查询已生成的新链接；从未写入的键返回 None
    pub async fn lookup(&self, source_url: &str) -> Result<Option<String>, RelayError> {
        let url: Option<String> = sqlx::query_scalar(
            "SELECT redistributed_url FROM redistributions WHERE source_url = ?",
        )
        .bind(source_url)
        .fetch_optional(&self.pool)
        .await?;

        debug!("🔍 缓存查询 {}: {}", source_url, if url.is_some() { "命中" } else { "未命中" });
        Ok(url)
    }

    /// 按 source_url 写入；已存在时替换链接、标题和网盘，保留首次创建时间
    pub async fn store(
        &self,
        source_url: &str,
        redistributed_url: &str,
        title: &str,
        provider: Provider,
    ) -> Result<(), RelayError> {
        if let Some(existing) = self.lookup(source_url).await? {
            if existing != redistributed_url {
                warn!(
                    "⚠️ 覆盖已有转存记录: {} ({} → {})",
                    source_url, existing, redistributed_url
                );
            }
        }

        sqlx::query(
            r#"
            INSERT INTO redistributions (source_url, redistributed_url, title, provider, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(source_url) DO UPDATE SET
                redistributed_url = excluded.redistributed_url,
                title = excluded.title,
                provider = excluded.provider
            "#,
        )
        .bind(source_url)
        .bind(redistributed_url)
        .bind(title)
        .bind(provider.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!("💾 已记录转存结果: {} → {}", source_url, redistributed_url);
        Ok(())
    }

    pub async fn record(
        &self,
        source_url: &str,
    ) -> Result<Option<RedistributionRecord>, RelayError> {
        let row = sqlx::query(
            r#"
            SELECT source_url, redistributed_url, title, provider, created_at
            FROM redistributions
            WHERE source_url = ?
            "#,
        )
        .bind(source_url)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let provider: String = row.try_get("provider")?;
        Ok(Some(RedistributionRecord {
            source_url: row.try_get("source_url")?,
            redistributed_url: row.try_get("redistributed_url")?,
            title: row.try_get("title")?,
            provider: provider.parse()?,
            created_at: row.try_get("created_at")?,
        }))
    }

    pub async fn count(&self) -> Result<i64, RelayError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM redistributions")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
