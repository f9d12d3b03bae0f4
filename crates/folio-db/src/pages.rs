//! Page repository implementation.

use std::time::Instant;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, warn};
use uuid::Uuid;

use folio_core::{
    AdjacentDirection, Error, Page, PageMetadataUpdate, PageRepository, PageSearchRequest, Result,
};

use crate::page_filter::{PageFilterQueryBuilder, QueryParam, PAGE_NUMBER_SORT_EXPR};

const PAGE_COLUMNS: &str = "p.id, p.volume_title, p.page_number, p.text, p.date, p.topics, p.keywords";

/// PostgreSQL implementation of PageRepository.
#[derive(Clone)]
pub struct PgPageRepository {
    pool: Pool<Postgres>,
}

impl PgPageRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn page_from_row(row: &PgRow) -> std::result::Result<Page, sqlx::Error> {
    Ok(Page {
        id: row.try_get("id")?,
        volume_title: row.try_get("volume_title")?,
        page_number: row.try_get("page_number")?,
        text: row.try_get("text")?,
        date: row.try_get("date")?,
        topics: row.try_get("topics")?,
        keywords: row.try_get("keywords")?,
    })
}

/// Decode rows, skipping any that fail to decode.
fn decode_pages(rows: &[PgRow]) -> Vec<Page> {
    rows.iter()
        .filter_map(|row| match page_from_row(row) {
            Ok(page) => Some(page),
            Err(e) => {
                warn!(
                    subsystem = "database",
                    component = "pages",
                    error = %e,
                    "Skipping page row that failed to decode"
                );
                None
            }
        })
        .collect()
}

#[async_trait]
impl PageRepository for PgPageRepository {
    async fn insert(&self, page: &Page) -> Result<()> {
        sqlx::query(
            "INSERT INTO page (id, volume_title, page_number, text, date, topics, keywords)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(page.id)
        .bind(&page.volume_title)
        .bind(&page.page_number)
        .bind(&page.text)
        .bind(&page.date)
        .bind(&page.topics)
        .bind(&page.keywords)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Page>> {
        let row = sqlx::query(&format!("SELECT {} FROM page p WHERE p.id = $1", PAGE_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(|r| page_from_row(&r))
            .transpose()
            .map_err(Error::Database)
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Page>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {} FROM page p WHERE p.id = ANY($1::uuid[])",
            PAGE_COLUMNS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let pages = decode_pages(&rows);
        debug!(
            subsystem = "database",
            component = "pages",
            op = "get_many",
            requested = ids.len(),
            result_count = pages.len(),
            "Fetched pages by id"
        );
        Ok(pages)
    }

    async fn search(&self, request: &PageSearchRequest, limit: i64) -> Result<Vec<Page>> {
        let start = Instant::now();
        let (filter_sql, params) = PageFilterQueryBuilder::new(request, 0).build();
        let limit_idx = params.len() + 1;

        let sql = format!(
            "SELECT {} FROM page p WHERE {} ORDER BY p.volume_title, {}, p.id LIMIT ${}",
            PAGE_COLUMNS, filter_sql, PAGE_NUMBER_SORT_EXPR, limit_idx
        );

        let mut query = sqlx::query(&sql);
        for param in params {
            query = match param {
                QueryParam::String(s) => query.bind(s),
                QueryParam::StringArray(arr) => query.bind(arr),
            };
        }

        let rows = query
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let pages = decode_pages(&rows);
        debug!(
            subsystem = "database",
            component = "pages",
            op = "search",
            result_count = pages.len(),
            limit,
            duration_ms = start.elapsed().as_millis() as u64,
            "Page search complete"
        );
        Ok(pages)
    }

    async fn adjacent(&self, page: &Page, direction: AdjacentDirection) -> Result<Option<Page>> {
        let (cmp, order) = match direction {
            AdjacentDirection::Next => (">", "ASC"),
            AdjacentDirection::Previous => ("<", "DESC"),
        };
        let sql = format!(
            "SELECT {cols} FROM page p
             WHERE p.volume_title = $1 AND {sort} {cmp} $2
             ORDER BY {sort} {order}, p.id {order}
             LIMIT 1",
            cols = PAGE_COLUMNS,
            sort = PAGE_NUMBER_SORT_EXPR,
            cmp = cmp,
            order = order,
        );

        let row = sqlx::query(&sql)
            .bind(&page.volume_title)
            .bind(page.page_number_value())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        row.map(|r| page_from_row(&r))
            .transpose()
            .map_err(Error::Database)
    }

    async fn list_dates(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT DISTINCT date FROM page
             WHERE date IS NOT NULL AND trim(date) <> ''
             ORDER BY date",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(|r| r.get("date")).collect())
    }

    async fn update_metadata(&self, id: Uuid, update: &PageMetadataUpdate) -> Result<bool> {
        if update.is_empty() {
            return Ok(false);
        }

        let result = sqlx::query(
            "UPDATE page
             SET date = CASE WHEN $2 THEN $3::text ELSE date END,
                 topics = COALESCE($4::text[], topics)
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.date.is_some())
        .bind(update.date.clone().flatten())
        .bind(update.topics.clone())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
