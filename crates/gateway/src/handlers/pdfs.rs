//! Public catalog handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use validator::Validate;

use crate::app::AppState;
use crate::extract::{parse_pdf_id, ApiJson};
use pdfhub_common::{
    catalog::{resolve_file_url, LinkMode, PdfRecord, PdfView, Rating, Review},
    errors::{AppError, Result},
    metrics, ALL_CATEGORIES,
};
use pdfhub_search::{BrowseMode, CategorySelection, MatchTrace};

/// Envelope for record listings
#[derive(Serialize)]
pub struct PdfListResponse {
    pub success: bool,
    pub pdfs: Vec<PdfView>,
}

impl PdfListResponse {
    fn new(records: impl IntoIterator<Item = PdfRecord>) -> Self {
        Self {
            success: true,
            pdfs: records.into_iter().map(PdfView::from).collect(),
        }
    }
}

/// Envelope for a single record
#[derive(Serialize)]
pub struct PdfResponse {
    pub success: bool,
    pub pdf: PdfView,
}

impl From<PdfRecord> for PdfResponse {
    fn from(record: PdfRecord) -> Self {
        Self {
            success: true,
            pdf: record.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BrowseParams {
    pub category: Option<String>,
    pub q: Option<String>,
    /// Include the per-record match trace
    #[serde(default)]
    pub trace: bool,
}

#[derive(Serialize)]
pub struct BrowseResponse {
    pub success: bool,
    pub mode: &'static str,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub pdfs: Vec<PdfView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<MatchTrace>>,
}

#[derive(Serialize)]
pub struct CategoriesResponse {
    pub success: bool,
    pub categories: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RateRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i64,
}

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    #[serde(default)]
    pub comment: String,
}

/// All records, newest first
pub async fn list_pdfs(State(state): State<AppState>) -> Result<Json<PdfListResponse>> {
    let records = state.catalog.list_all().await?;
    Ok(Json(PdfListResponse::new(records)))
}

/// Trending records, newest first
pub async fn trending_pdfs(State(state): State<AppState>) -> Result<Json<PdfListResponse>> {
    let records = state.catalog.list_trending().await?;
    Ok(Json(PdfListResponse::new(records)))
}

/// Server-side substring search over title, category and tags
pub async fn search_pdfs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<PdfListResponse>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::Validation {
            message: "Search query is required".to_string(),
            field: Some("q".to_string()),
        });
    }

    let start = Instant::now();
    let records = state.catalog.search_fields(query).await?;
    metrics::record_catalog_query(start.elapsed().as_secs_f64(), "fields");

    Ok(Json(PdfListResponse::new(records)))
}

/// Category browsing and ranked free-text search over the whole catalog
pub async fn browse_pdfs(
    State(state): State<AppState>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<BrowseResponse>> {
    let records = state.catalog.list_all().await?;

    let mode = BrowseMode::default()
        .select_category(CategorySelection::parse(params.category.as_deref()))
        .enter_query(params.q.as_deref().unwrap_or_default());

    let start = Instant::now();
    let (matched, trace) = if params.trace {
        let outcome = state.filter.apply_traced(&records, &mode);
        (outcome.records, outcome.trace)
    } else {
        (state.filter.apply(&records, &mode), None)
    };
    metrics::record_catalog_query(start.elapsed().as_secs_f64(), mode.kind());

    tracing::debug!(
        mode = mode.kind(),
        category = mode.category().label(),
        matched = matched.len(),
        total = records.len(),
        "Catalog filtered"
    );

    Ok(Json(BrowseResponse {
        success: true,
        mode: mode.kind(),
        category: mode.category().label().to_string(),
        query: mode.query().map(|q| q.trim().to_string()),
        pdfs: matched.into_iter().cloned().map(PdfView::from).collect(),
        trace,
    }))
}

/// Browsable category labels, "All" first
pub async fn list_categories(State(state): State<AppState>) -> Json<CategoriesResponse> {
    let categories = std::iter::once(ALL_CATEGORIES.to_string())
        .chain(state.config.matching.categories.iter().cloned())
        .collect();

    Json(CategoriesResponse {
        success: true,
        categories,
    })
}

/// Get a record by ID
pub async fn get_pdf(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<PdfResponse>> {
    let record = state.catalog.get_by_id(parse_pdf_id(&id)?).await?;
    Ok(Json(record.into()))
}

pub async fn view_pdf(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    redirect_to_file(&state, &id, LinkMode::View).await
}

pub async fn download_pdf(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse> {
    redirect_to_file(&state, &id, LinkMode::Download).await
}

async fn redirect_to_file(state: &AppState, id: &str, mode: LinkMode) -> Result<impl IntoResponse> {
    let record = state.catalog.get_by_id(parse_pdf_id(id)?).await?;
    let location = resolve_file_url(&record.file_url, mode);

    let kind = match mode {
        LinkMode::View => "view",
        LinkMode::Download => "download",
    };
    metrics::record_redirect(kind);

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]))
}

/// Append a 1-5 star rating
pub async fn rate_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<RateRequest>,
) -> Result<Json<PdfResponse>> {
    let id = parse_pdf_id(&id)?;
    // Unknown records are reported before the value is checked
    state.catalog.get_by_id(id).await?;
    request.validate()?;
    let rating = Rating::new(request.rating)?;

    let record = state.catalog.append_rating(id, rating).await?;
    metrics::record_rating(rating.value());

    tracing::info!(
        pdf_id = %id,
        rating = rating.value(),
        rating_count = record.ratings.len(),
        "Rating appended"
    );

    Ok(Json(record.into()))
}

/// Append an anonymous review
pub async fn review_pdf(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ReviewRequest>,
) -> Result<Json<PdfResponse>> {
    let id = parse_pdf_id(&id)?;
    state.catalog.get_by_id(id).await?;
    let review = Review::new(&request.comment)?;

    let record = state.catalog.append_review(id, review).await?;
    metrics::record_review();

    tracing::info!(
        pdf_id = %id,
        review_count = record.reviews.len(),
        "Review appended"
    );

    Ok(Json(record.into()))
}
