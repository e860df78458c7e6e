//! PostgreSQL implementation of the catalog and admin stores
//!
//! Tags, ratings and reviews live in JSONB columns. Rating and review
//! submissions are appended with a single `UPDATE ... RETURNING` so concurrent
//! submissions never overwrite each other.

use crate::catalog::{
    AdminAccount, AdminStore, CatalogStore, NewPdf, PdfPatch, PdfRecord, Rating, Review,
};
use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::{NotSet, Set, Unchanged}, ColumnTrait, DatabaseConnection,
    DbBackend, EntityTrait, QueryFilter, QueryOrder, SqlErr, Statement,
};
use serde_json::json;
use uuid::Uuid;

/// Catalog store backed by PostgreSQL through SeaORM
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    /// Create a new store with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> &DatabaseConnection {
        self.pool.conn()
    }

    async fn append_json(&self, id: Uuid, column: &str, items: serde_json::Value) -> Result<PdfRecord> {
        // `column` is one of our own constant names, never user input
        let sql = format!(
            "UPDATE pdfs SET {column} = {column} || $2::jsonb WHERE id = $1 RETURNING *"
        );
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            &sql,
            vec![id.into(), items.into()],
        );

        let row = PdfEntity::find()
            .from_raw_sql(stmt)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::PdfNotFound { id: id.to_string() })?;

        row_to_record(row)
    }
}

fn row_to_record(row: PdfRow) -> Result<PdfRecord> {
    Ok(PdfRecord {
        id: row.id,
        title: row.title,
        description: row.description,
        category: row.category,
        tags: serde_json::from_value(row.tags)?,
        file_url: row.file_url,
        thumbnail: row.thumbnail,
        is_trending: row.is_trending,
        uploaded_at: row.uploaded_at.with_timezone(&Utc),
        ratings: serde_json::from_value(row.ratings)?,
        reviews: serde_json::from_value(row.reviews)?,
    })
}

fn rows_to_records(rows: Vec<PdfRow>) -> Result<Vec<PdfRecord>> {
    rows.into_iter().map(row_to_record).collect()
}

/// Escape LIKE metacharacters so the query is matched literally
fn like_pattern(query: &str) -> String {
    let escaped = query
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait::async_trait]
impl CatalogStore for PgStore {
    async fn list_all(&self) -> Result<Vec<PdfRecord>> {
        let rows = PdfEntity::find()
            .order_by_desc(PdfColumn::UploadedAt)
            .all(self.conn())
            .await?;
        rows_to_records(rows)
    }

    async fn list_trending(&self) -> Result<Vec<PdfRecord>> {
        let rows = PdfEntity::find()
            .filter(PdfColumn::IsTrending.eq(true))
            .order_by_desc(PdfColumn::UploadedAt)
            .all(self.conn())
            .await?;
        rows_to_records(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<PdfRecord> {
        let row = PdfEntity::find_by_id(id)
            .one(self.conn())
            .await?
            .ok_or_else(|| AppError::PdfNotFound { id: id.to_string() })?;
        row_to_record(row)
    }

    async fn insert(&self, pdf: NewPdf) -> Result<PdfRecord> {
        let record = pdf.validated()?.into_record();

        let model = PdfActiveModel {
            id: Set(record.id),
            title: Set(record.title.clone()),
            description: Set(record.description.clone()),
            category: Set(record.category.clone()),
            tags: Set(json!(record.tags)),
            file_url: Set(record.file_url.clone()),
            thumbnail: Set(record.thumbnail.clone()),
            is_trending: Set(record.is_trending),
            uploaded_at: Set(record.uploaded_at.into()),
            ratings: Set(json!([])),
            reviews: Set(json!([])),
        };

        let row = model.insert(self.conn()).await?;
        row_to_record(row)
    }

    async fn update(&self, id: Uuid, patch: PdfPatch) -> Result<PdfRecord> {
        let mut record = self.get_by_id(id).await?;
        patch.apply(&mut record);

        let model = PdfActiveModel {
            id: Unchanged(id),
            title: Set(record.title),
            description: Set(record.description),
            category: Set(record.category),
            tags: Set(json!(record.tags)),
            file_url: Set(record.file_url),
            thumbnail: Set(record.thumbnail),
            is_trending: Set(record.is_trending),
            uploaded_at: NotSet,
            ratings: NotSet,
            reviews: NotSet,
        };

        let row = model.update(self.conn()).await?;
        row_to_record(row)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = PdfEntity::delete_by_id(id).exec(self.conn()).await?;
        if result.rows_affected == 0 {
            return Err(AppError::PdfNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn append_rating(&self, id: Uuid, rating: Rating) -> Result<PdfRecord> {
        self.append_json(id, "ratings", json!([rating.value()])).await
    }

    async fn append_review(&self, id: Uuid, review: Review) -> Result<PdfRecord> {
        self.append_json(id, "reviews", serde_json::to_value(vec![review])?).await
    }

    async fn search_fields(&self, query: &str) -> Result<Vec<PdfRecord>> {
        let sql = r#"
            SELECT * FROM pdfs
            WHERE title ILIKE $1
               OR category ILIKE $1
               OR EXISTS (
                   SELECT 1 FROM jsonb_array_elements_text(tags) AS t(tag)
                   WHERE t.tag ILIKE $1
               )
            ORDER BY uploaded_at DESC
        "#;
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            sql,
            vec![like_pattern(query).into()],
        );

        let rows = PdfEntity::find().from_raw_sql(stmt).all(self.conn()).await?;
        rows_to_records(rows)
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }
}

#[async_trait::async_trait]
impl AdminStore for PgStore {
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>> {
        let row = AdminEntity::find()
            .filter(AdminColumn::Email.eq(email))
            .one(self.conn())
            .await?;

        Ok(row.map(|a| AdminAccount {
            id: a.id,
            email: a.email,
            password_hash: a.password_hash,
            created_at: a.created_at.with_timezone(&Utc),
        }))
    }

    async fn create_admin(&self, email: &str, password_hash: &str) -> Result<AdminAccount> {
        if self.find_admin_by_email(email).await?.is_some() {
            return Err(AppError::validation("Admin already exists"));
        }

        let model = AdminActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash.to_string()),
            created_at: Set(Utc::now().into()),
        };

        let row = model.insert(self.conn()).await.map_err(|e| {
            // Lost a race with a concurrent registration of the same email
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                AppError::validation("Admin already exists")
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(AdminAccount {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at.with_timezone(&Utc),
        })
    }
}
