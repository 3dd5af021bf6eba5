use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::errors::{PromptError, PromptResult};
use crate::domain::repositories::{Pagination, TemplateFilter, TemplateRepository};
use crate::domain::template::{Template, TemplateStatus, TemplateUpdate, Variable, Version};

const TEMPLATE_COLUMNS: &str = "id, name, description, status, tags, metadata, \
                                current_version_id, created_at, updated_at";

const VERSION_COLUMNS: &str = "id, template_id, version, content, variables, \
                               is_active, created_at, updated_at";

#[derive(Debug, FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    description: String,
    status: TemplateStatus,
    tags: Vec<String>,
    metadata: Json<HashMap<String, String>>,
    current_version_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TemplateRow> for Template {
    fn from(r: TemplateRow) -> Self {
        Template::from_persistence(
            r.id,
            r.name,
            r.description,
            r.status,
            r.tags,
            r.metadata.0,
            r.current_version_id,
            r.created_at,
            r.updated_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct VersionRow {
    id: Uuid,
    template_id: Uuid,
    version: String,
    content: String,
    variables: Json<Vec<Variable>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VersionRow> for Version {
    fn from(r: VersionRow) -> Self {
        Version::from_persistence(
            r.id,
            r.template_id,
            r.version,
            r.content,
            r.variables.0,
            r.is_active,
            r.created_at,
            r.updated_at,
        )
    }
}

/// Classifies a sqlx error into the domain taxonomy
///
/// Unique violations become `Conflict` with `conflict` as message, foreign
/// key violations mean the parent template is gone.
fn classify(err: sqlx::Error, conflict: &str, context: &str) -> PromptError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return PromptError::conflict(conflict);
        }
        if db.is_foreign_key_violation() {
            return PromptError::not_found("template not found");
        }
    }
    tracing::error!(error = %err, "{}", context);
    PromptError::internal(format!("{}: {}", context, err))
}

fn internal(context: &'static str) -> impl Fn(sqlx::Error) -> PromptError {
    move |err| {
        tracing::error!(error = %err, "{}", context);
        PromptError::internal(format!("{}: {}", context, err))
    }
}

/// PostgreSQL implementation of TemplateRepository
///
/// Expects the schema in `migrations/001_prompt_templates.sql`. Multi-row
/// writes run inside a single transaction.
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    /// Creates a new PostgresTemplateRepository
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert_template(conn: &mut PgConnection, template: &Template) -> PromptResult<()> {
        sqlx::query(
            r#"
            INSERT INTO prompt_templates (
                id, name, description, status, tags, metadata,
                current_version_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(template.id())
        .bind(template.name())
        .bind(template.description())
        .bind(template.status())
        .bind(template.tags())
        .bind(Json(template.metadata()))
        .bind(template.current_version_id())
        .bind(template.created_at())
        .bind(template.updated_at())
        .execute(conn)
        .await
        .map_err(|e| {
            classify(
                e,
                "template with this name already exists",
                "Failed to create template",
            )
        })?;

        Ok(())
    }

    async fn insert_version(conn: &mut PgConnection, version: &Version) -> PromptResult<()> {
        sqlx::query(
            r#"
            INSERT INTO prompt_versions (
                id, template_id, version, content, variables,
                is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(version.id())
        .bind(version.template_id())
        .bind(version.label())
        .bind(version.content())
        .bind(Json(version.variables()))
        .bind(version.is_active())
        .bind(version.created_at())
        .bind(version.updated_at())
        .execute(conn)
        .await
        .map_err(|e| {
            classify(
                e,
                &format!("version {} already exists for this template", version.label()),
                "Failed to create version",
            )
        })?;

        Ok(())
    }

    async fn template_exists(&self, id: Uuid) -> PromptResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM prompt_templates WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await
                .map_err(internal("Failed to check template"))?;

        Ok(exists)
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    async fn create(&self, template: &Template) -> PromptResult<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(internal("Failed to acquire connection"))?;

        Self::insert_template(&mut conn, template).await
    }

    async fn create_with_version(
        &self,
        template: &Template,
        version: &Version,
    ) -> PromptResult<Template> {
        let mut template = template.clone();
        template.set_current_version(version.id());

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(internal("Failed to begin transaction"))?;

        Self::insert_template(&mut tx, &template).await?;
        Self::insert_version(&mut tx, version).await?;

        tx.commit()
            .await
            .map_err(internal("Failed to commit template creation"))?;

        Ok(template)
    }

    async fn find_by_id(&self, id: Uuid) -> PromptResult<Option<Template>> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {} FROM prompt_templates WHERE id = $1",
            TEMPLATE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("Failed to find template by id"))?;

        Ok(row.map(Template::from))
    }

    async fn find_by_name(&self, name: &str) -> PromptResult<Option<Template>> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            "SELECT {} FROM prompt_templates WHERE name = $1",
            TEMPLATE_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("Failed to find template by name"))?;

        Ok(row.map(Template::from))
    }

    async fn list(
        &self,
        filter: &TemplateFilter,
        pagination: Pagination,
    ) -> PromptResult<(Vec<Template>, u64)> {
        // An empty tag array is contained in every row.
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM prompt_templates
            WHERE ($1::template_status IS NULL OR status = $1)
              AND tags @> $2
            "#,
        )
        .bind(filter.status)
        .bind(filter.tags.as_slice())
        .fetch_one(&self.pool)
        .await
        .map_err(internal("Failed to count templates"))?;

        let rows: Vec<TemplateRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}
            FROM prompt_templates
            WHERE ($1::template_status IS NULL OR status = $1)
              AND tags @> $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            TEMPLATE_COLUMNS
        ))
        .bind(filter.status)
        .bind(filter.tags.as_slice())
        .bind(i64::from(pagination.page_size()))
        .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(internal("Failed to list templates"))?;

        Ok((
            rows.into_iter().map(Template::from).collect(),
            u64::try_from(total).unwrap_or_default(),
        ))
    }

    async fn update(&self, id: Uuid, update: &TemplateUpdate) -> PromptResult<Template> {
        let row: Option<TemplateRow> = sqlx::query_as(&format!(
            r#"
            UPDATE prompt_templates SET
                description = COALESCE($2, description),
                status = COALESCE($3, status),
                tags = COALESCE($4, tags),
                metadata = COALESCE($5, metadata),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            TEMPLATE_COLUMNS
        ))
        .bind(id)
        .bind(update.description.as_deref())
        .bind(update.status)
        .bind(update.tags.as_deref())
        .bind(update.metadata.as_ref().map(Json))
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("Failed to update template"))?;

        row.map(Template::from)
            .ok_or_else(|| PromptError::not_found("template not found"))
    }

    async fn delete(&self, id: Uuid) -> PromptResult<()> {
        // prompt_versions rows go with it via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM prompt_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(internal("Failed to delete template"))?;

        if result.rows_affected() == 0 {
            return Err(PromptError::not_found("template not found"));
        }

        Ok(())
    }

    async fn create_version(&self, version: &Version) -> PromptResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(internal("Failed to begin transaction"))?;

        Self::insert_version(&mut tx, version).await?;

        sqlx::query(
            r#"
            UPDATE prompt_templates
            SET current_version_id = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(version.id())
        .bind(version.template_id())
        .execute(&mut *tx)
        .await
        .map_err(internal("Failed to promote version"))?;

        tx.commit()
            .await
            .map_err(internal("Failed to commit version creation"))?;

        Ok(())
    }

    async fn find_version(&self, template_id: Uuid, label: &str) -> PromptResult<Option<Version>> {
        let row: Option<VersionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM prompt_versions WHERE template_id = $1 AND version = $2",
            VERSION_COLUMNS
        ))
        .bind(template_id)
        .bind(label)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("Failed to find version"))?;

        Ok(row.map(Version::from))
    }

    async fn find_version_by_id(&self, id: Uuid) -> PromptResult<Option<Version>> {
        let row: Option<VersionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM prompt_versions WHERE id = $1",
            VERSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("Failed to find version by id"))?;

        Ok(row.map(Version::from))
    }

    async fn list_versions(&self, template_id: Uuid) -> PromptResult<Vec<Version>> {
        if !self.template_exists(template_id).await? {
            return Err(PromptError::not_found("template not found"));
        }

        let rows: Vec<VersionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM prompt_versions WHERE template_id = $1 ORDER BY created_at ASC",
            VERSION_COLUMNS
        ))
        .bind(template_id)
        .fetch_all(&self.pool)
        .await
        .map_err(internal("Failed to list versions"))?;

        Ok(rows.into_iter().map(Version::from).collect())
    }

    async fn set_current_version(&self, template_id: Uuid, label: &str) -> PromptResult<Template> {
        let row: Option<TemplateRow> = sqlx::query_as(
            r#"
            UPDATE prompt_templates t
            SET current_version_id = v.id, updated_at = NOW()
            FROM prompt_versions v
            WHERE t.id = $1 AND v.template_id = t.id AND v.version = $2
            RETURNING t.id, t.name, t.description, t.status, t.tags, t.metadata,
                      t.current_version_id, t.created_at, t.updated_at
            "#,
        )
        .bind(template_id)
        .bind(label)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal("Failed to set current version"))?;

        match row {
            Some(row) => Ok(Template::from(row)),
            None if self.template_exists(template_id).await? => {
                Err(PromptError::not_found("version not found"))
            }
            None => Err(PromptError::not_found("template not found")),
        }
    }
}
