//! Project repository implementation.
//!
//! `page_keywords` and `page_metadata` are stored as JSONB maps keyed by page
//! id. They are parsed leniently on read, so a hand-edited or legacy row never
//! fails a request.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use folio_core::annotation::{parse_page_keywords, parse_page_metadata};
use folio_core::{
    dedup_page_ids, new_v7, AnnotationPatch, Error, PageAnnotation, Project, ProjectRepository,
    ProjectUpdate, Result,
};

const PROJECT_COLUMNS: &str =
    "id, title, description, pages, page_keywords, page_metadata, created_at_utc, updated_at_utc";

/// PostgreSQL implementation of ProjectRepository.
#[derive(Clone)]
pub struct PgProjectRepository {
    pool: Pool<Postgres>,
}

impl PgProjectRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn project_from_row(row: &PgRow) -> std::result::Result<Project, sqlx::Error> {
    let page_keywords: Value = row.try_get("page_keywords")?;
    let page_metadata: Value = row.try_get("page_metadata")?;
    Ok(Project {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        pages: row.try_get("pages")?,
        page_keywords: parse_page_keywords(&page_keywords),
        page_metadata: parse_page_metadata(&page_metadata),
        created_at_utc: row.try_get("created_at_utc")?,
        updated_at_utc: row.try_get("updated_at_utc")?,
    })
}

#[async_trait]
impl ProjectRepository for PgProjectRepository {
    async fn create(&self) -> Result<Project> {
        let project = Project::empty(new_v7(), Utc::now());

        sqlx::query(
            "INSERT INTO project (id, title, description, pages, page_keywords, page_metadata, created_at_utc, updated_at_utc)
             VALUES ($1, '', '', '{}', '{}'::jsonb, '{}'::jsonb, $2, $2)",
        )
        .bind(project.id)
        .bind(project.created_at_utc)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "projects",
            op = "create",
            project_id = %project.id,
            "Created project"
        );
        Ok(project)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Project>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM project WHERE id = $1",
            PROJECT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| project_from_row(&r))
            .transpose()
            .map_err(Error::Database)
    }

    async fn list(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM project ORDER BY created_at_utc, id",
            PROJECT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let projects: Vec<Project> = rows
            .iter()
            .filter_map(|row| match project_from_row(row) {
                Ok(project) => Some(project),
                Err(e) => {
                    warn!(
                        subsystem = "database",
                        component = "projects",
                        error = %e,
                        "Skipping project row that failed to decode"
                    );
                    None
                }
            })
            .collect();

        debug!(
            subsystem = "database",
            component = "projects",
            op = "list",
            result_count = projects.len(),
            "Listed projects"
        );
        Ok(projects)
    }

    async fn update(&self, id: Uuid, update: &ProjectUpdate) -> Result<bool> {
        let pages = update.pages.as_deref().map(dedup_page_ids);
        let page_keywords = update
            .page_keywords
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let page_metadata = update
            .page_metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let result = sqlx::query(
            "UPDATE project
             SET title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 pages = COALESCE($4::uuid[], pages),
                 page_keywords = COALESCE($5::jsonb, page_keywords),
                 page_metadata = COALESCE($6::jsonb, page_metadata),
                 updated_at_utc = $7
             WHERE id = $1",
        )
        .bind(id)
        .bind(update.title.clone())
        .bind(update.description.clone())
        .bind(pages)
        .bind(page_keywords)
        .bind(page_metadata)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM project WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn merge_page_annotation(
        &self,
        project_id: Uuid,
        page_id: Uuid,
        patch: &AnnotationPatch,
    ) -> Result<bool> {
        let key = page_id.to_string();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Row lock serializes concurrent merges into the same project
        let row = sqlx::query(
            "SELECT page_metadata -> $2 AS annotation FROM project WHERE id = $1 FOR UPDATE",
        )
        .bind(project_id)
        .bind(&key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::ProjectNotFound(project_id))?;

        let stored: Option<Value> = row.try_get("annotation").map_err(Error::Database)?;
        let existing = stored
            .as_ref()
            .map(PageAnnotation::from_value)
            .unwrap_or_default();
        let merged = existing.merged(patch);

        let result = sqlx::query(
            "UPDATE project
             SET page_metadata = jsonb_set(
                     CASE WHEN jsonb_typeof(page_metadata) = 'object' THEN page_metadata ELSE '{}'::jsonb END,
                     ARRAY[$2::text],
                     $3::jsonb,
                     true
                 ),
                 updated_at_utc = $4
             WHERE id = $1",
        )
        .bind(project_id)
        .bind(&key)
        .bind(serde_json::to_value(&merged)?)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "projects",
            op = "merge_page_annotation",
            project_id = %project_id,
            page_id = %page_id,
            passages = merged.passages.len(),
            "Merged page annotation"
        );
        Ok(result.rows_affected() > 0)
    }
}
