//! Application state and router assembly

use crate::handlers;
use crate::middleware::{rate_limit_middleware, track_metrics, PublicWriteLimiter};
use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use pdfhub_common::{
    auth::JwtManager,
    catalog::{AdminStore, CatalogStore},
    config::AppConfig,
    storage::ThumbnailStore,
};
use pdfhub_search::CatalogFilter;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub catalog: Arc<dyn CatalogStore>,
    pub admins: Arc<dyn AdminStore>,
    pub thumbnails: Arc<dyn ThumbnailStore>,
    pub jwt: Arc<JwtManager>,
    pub filter: Arc<CatalogFilter>,
}

impl FromRef<AppState> for Arc<JwtManager> {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Anonymous writes
    let mut public_writes = Router::new()
        .route("/pdfs/{id}/rate", post(handlers::pdfs::rate_pdf))
        .route("/pdfs/{id}/review", post(handlers::pdfs::review_pdf));
    if let Some(limiter) = PublicWriteLimiter::from_config(&config.rate_limit) {
        public_writes = public_writes.route_layer(from_fn_with_state(limiter, rate_limit_middleware));
    }

    let api_routes = Router::new()
        // Public catalog
        .route("/pdfs", get(handlers::pdfs::list_pdfs))
        .route("/pdfs/trending", get(handlers::pdfs::trending_pdfs))
        .route("/pdfs/search", get(handlers::pdfs::search_pdfs))
        .route("/pdfs/browse", get(handlers::pdfs::browse_pdfs))
        .route("/pdfs/categories", get(handlers::pdfs::list_categories))
        .route("/pdfs/view/{id}", get(handlers::pdfs::view_pdf))
        .route("/pdfs/download/{id}", get(handlers::pdfs::download_pdf))
        .route("/pdfs/{id}", get(handlers::pdfs::get_pdf))
        .merge(public_writes)

        // Administration
        .route("/admin/register", post(handlers::admin::register))
        .route("/admin/login", post(handlers::admin::login))
        .route("/admin/upload-pdf", post(handlers::admin::upload_pdf))
        .route("/admin/edit-pdf/{id}", put(handlers::admin::edit_pdf))
        .route("/admin/delete-pdf/{id}", delete(handlers::admin::delete_pdf))
        .route("/admin/set-trending/{id}", post(handlers::admin::set_trending))
        .route_layer(from_fn(track_metrics));

    // Compose the app
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/api", api_routes)
        .nest_service("/uploads", ServeDir::new(&config.storage.thumbnail_dir))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(config.server.body_limit_bytes))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use pdfhub_common::{
        auth::hash_password,
        catalog::{MemoryStore, NewPdf, PdfRecord},
        storage::LocalThumbnailStore,
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub const ADMIN_EMAIL: &str = "admin@example.com";
    pub const ADMIN_PASSWORD: &str = "correct-horse";

    /// Router over an in-memory catalog with its own thumbnail directory
    pub struct TestApp {
        pub router: Router,
        pub store: Arc<MemoryStore>,
        pub jwt: Arc<JwtManager>,
        pub uploads: TempDir,
    }

    impl TestApp {
        pub fn new() -> Self {
            Self::with_config(AppConfig::default())
        }

        pub fn with_config(config: AppConfig) -> Self {
            Self::build(config, |store| store as Arc<dyn CatalogStore>)
        }

        /// Serve the catalog through a wrapper around the in-memory store
        pub fn with_catalog(wrap: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn CatalogStore>) -> Self {
            Self::build(AppConfig::default(), wrap)
        }

        fn build(mut config: AppConfig, wrap: impl FnOnce(Arc<MemoryStore>) -> Arc<dyn CatalogStore>) -> Self {
            let uploads = TempDir::new().unwrap();
            config.storage.thumbnail_dir = uploads.path().to_string_lossy().into_owned();

            let store = Arc::new(MemoryStore::new());
            let jwt = Arc::new(JwtManager::new("test-secret", 3600));
            let state = AppState {
                filter: Arc::new(CatalogFilter::new(&config.matching)),
                thumbnails: Arc::new(LocalThumbnailStore::new(&config.storage)),
                config: Arc::new(config),
                catalog: wrap(store.clone()),
                admins: store.clone(),
                jwt: jwt.clone(),
            };

            Self {
                router: create_router(state),
                store,
                jwt,
                uploads,
            }
        }

        /// Files currently in the thumbnail directory
        pub fn stored_thumbnails(&self) -> usize {
            std::fs::read_dir(self.uploads.path()).unwrap().count()
        }

        pub async fn seed(&self, pdf: NewPdf) -> PdfRecord {
            self.store.insert(pdf).await.unwrap()
        }

        /// Bearer token for a freshly created administrator
        pub async fn admin_token(&self) -> String {
            let hash = hash_password(ADMIN_PASSWORD).unwrap();
            let admin = self.store.create_admin(ADMIN_EMAIL, &hash).await.unwrap();
            self.jwt.generate_token(admin.id, &admin.email).unwrap()
        }

        pub async fn send(&self, request: Request<Body>) -> Response {
            self.router.clone().oneshot(request).await.unwrap()
        }

        pub async fn get(&self, uri: &str) -> Response {
            self.send(Request::get(uri).body(Body::empty()).unwrap()).await
        }

        pub async fn post_json(&self, uri: &str, body: Value) -> Response {
            self.send(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
        }
    }

    pub fn pdf(title: &str) -> NewPdf {
        NewPdf {
            title: title.to_string(),
            file_url: format!("https://example.com/{}.pdf", title.replace(' ', "-")),
            ..NewPdf::default()
        }
    }

    pub async fn json_body(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Hand-built multipart body; `file` is `(field, file name, content type, bytes)`
    pub fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> (String, Vec<u8>) {
        let boundary = "pdfhub-test-boundary";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!("--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes(),
            );
        }
        if let Some((name, file_name, content_type, bytes)) = file {
            body.extend_from_slice(
                format!(
                    "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
        (format!("multipart/form-data; boundary={boundary}"), body)
    }
}
