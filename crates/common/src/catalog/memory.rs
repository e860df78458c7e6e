//! In-process catalog used when no database is configured, and by tests

use super::{
    matches_fields, AdminAccount, AdminStore, CatalogStore, NewPdf, PdfPatch, PdfRecord, Rating,
    Review,
};
use crate::errors::{AppError, Result};
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Catalog and admin accounts held behind async locks.
///
/// Records are kept in insertion order; listings walk them newest first.
#[derive(Default)]
pub struct MemoryStore {
    pdfs: RwLock<Vec<PdfRecord>>,
    admins: RwLock<Vec<AdminAccount>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<F>(&self, id: Uuid, f: F) -> Result<PdfRecord>
    where
        F: FnOnce(&mut PdfRecord) + Send,
    {
        let mut pdfs = self.pdfs.write().await;
        let pdf = pdfs
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::PdfNotFound { id: id.to_string() })?;
        f(pdf);
        Ok(pdf.clone())
    }

    async fn newest_first<P>(&self, predicate: P) -> Vec<PdfRecord>
    where
        P: Fn(&PdfRecord) -> bool,
    {
        self.pdfs
            .read()
            .await
            .iter()
            .rev()
            .filter(|p| predicate(p))
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl CatalogStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<PdfRecord>> {
        Ok(self.newest_first(|_| true).await)
    }

    async fn list_trending(&self) -> Result<Vec<PdfRecord>> {
        Ok(self.newest_first(|p| p.is_trending).await)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<PdfRecord> {
        self.pdfs
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| AppError::PdfNotFound { id: id.to_string() })
    }

    async fn insert(&self, pdf: NewPdf) -> Result<PdfRecord> {
        let record = pdf.validated()?.into_record();
        self.pdfs.write().await.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, patch: PdfPatch) -> Result<PdfRecord> {
        self.modify(id, |pdf| patch.apply(pdf)).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut pdfs = self.pdfs.write().await;
        let before = pdfs.len();
        pdfs.retain(|p| p.id != id);
        if pdfs.len() == before {
            return Err(AppError::PdfNotFound { id: id.to_string() });
        }
        Ok(())
    }

    async fn append_rating(&self, id: Uuid, rating: Rating) -> Result<PdfRecord> {
        self.modify(id, |pdf| pdf.ratings.push(rating.value())).await
    }

    async fn append_review(&self, id: Uuid, review: Review) -> Result<PdfRecord> {
        self.modify(id, |pdf| pdf.reviews.push(review)).await
    }

    async fn search_fields(&self, query: &str) -> Result<Vec<PdfRecord>> {
        Ok(self.newest_first(|p| matches_fields(p, query)).await)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait::async_trait]
impl AdminStore for MemoryStore {
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<AdminAccount>> {
        Ok(self
            .admins
            .read()
            .await
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn create_admin(&self, email: &str, password_hash: &str) -> Result<AdminAccount> {
        let mut admins = self.admins.write().await;
        if admins.iter().any(|a| a.email == email) {
            return Err(AppError::validation("Admin already exists"));
        }
        let admin = AdminAccount {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        admins.push(admin.clone());
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_pdf(title: &str) -> NewPdf {
        NewPdf {
            title: title.into(),
            file_url: format!("https://files.example.com/{}.pdf", title),
            ..NewPdf::default()
        }
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let store = MemoryStore::new();
        let first = store.insert(new_pdf("first")).await.unwrap();
        let second = store.insert(new_pdf("second")).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.iter().map(|p| p.id).collect::<Vec<_>>(), vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_trending_filter() {
        let store = MemoryStore::new();
        let a = store.insert(new_pdf("a")).await.unwrap();
        store.insert(new_pdf("b")).await.unwrap();
        store.set_trending(a.id, true).await.unwrap();

        let trending = store.list_trending().await.unwrap();
        assert_eq!(trending.len(), 1);
        assert_eq!(trending[0].id, a.id);
    }

    #[tokio::test]
    async fn test_append_rating_and_review() {
        let store = MemoryStore::new();
        let pdf = store.insert(new_pdf("rated")).await.unwrap();

        store.append_rating(pdf.id, Rating::new(5).unwrap()).await.unwrap();
        store.append_rating(pdf.id, Rating::new(3).unwrap()).await.unwrap();
        let updated = store.append_rating(pdf.id, Rating::new(4).unwrap()).await.unwrap();
        assert_eq!(updated.ratings, vec![5, 3, 4]);
        assert_eq!(updated.average_rating(), 4.0);

        store.append_review(pdf.id, Review::new("first").unwrap()).await.unwrap();
        let updated = store.append_review(pdf.id, Review::new("second").unwrap()).await.unwrap();
        assert_eq!(updated.reviews.last().unwrap().comment(), "second");
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.get_by_id(id).await, Err(AppError::PdfNotFound { .. })));
        assert!(matches!(store.delete(id).await, Err(AppError::PdfNotFound { .. })));
        assert!(matches!(
            store.append_rating(id, Rating::new(2).unwrap()).await,
            Err(AppError::PdfNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_is_hard() {
        let store = MemoryStore::new();
        let pdf = store.insert(new_pdf("gone")).await.unwrap();
        store.delete(pdf.id).await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
        assert!(store.get_by_id(pdf.id).await.is_err());
    }

    #[tokio::test]
    async fn test_search_fields() {
        let store = MemoryStore::new();
        let mut pdf = new_pdf("Intro to Figma");
        pdf.tags = vec!["Design".into()];
        store.insert(pdf).await.unwrap();
        store.insert(new_pdf("Rust")).await.unwrap();

        assert_eq!(store.search_fields("design").await.unwrap().len(), 1);
        assert_eq!(store.search_fields("FIGMA").await.unwrap().len(), 1);
        assert!(store.search_fields("python").await.unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_admin_rejected() {
        let store = MemoryStore::new();
        tokio_test::block_on(async {
            store.create_admin("a@b.c", "hash").await.unwrap();
            let err = store.create_admin("a@b.c", "other").await.unwrap_err();
            assert_eq!(err.to_string(), "Admin already exists");
            assert!(store.find_admin_by_email("a@b.c").await.unwrap().is_some());
            assert!(store.find_admin_by_email("x@y.z").await.unwrap().is_none());
        });
    }
}
