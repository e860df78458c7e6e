//! Administrator handlers
//!
//! Registration and login are open; every catalog mutation requires a bearer
//! token issued by `login`.

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::pdfs::PdfResponse;
use crate::app::AppState;
use crate::extract::{parse_pdf_id, ApiJson};
use pdfhub_common::{
    auth::{hash_password, verify_password, AdminContext},
    catalog::{parse_tags, NewPdf, PdfPatch},
    errors::{AppError, Result},
    metrics,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(email(message = "A valid email is required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTrendingRequest {
    pub is_trending: bool,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct AdminSummary {
    pub email: String,
    pub id: Uuid,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub admin: AdminSummary,
}

/// Uploaded thumbnail part
struct ThumbnailUpload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Text fields and thumbnail of an upload or edit form
#[derive(Default)]
struct PdfForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    tags: Option<String>,
    pdf_link: Option<String>,
    is_trending: Option<bool>,
    thumbnail: Option<ThumbnailUpload>,
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::InvalidFormat {
        message: err.body_text(),
    }
}

fn parse_flag(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Ok(true),
        "false" | "0" | "off" => Ok(false),
        _ => Err(AppError::Validation {
            message: "isTrending must be true or false".to_string(),
            field: Some("isTrending".to_string()),
        }),
    }
}

impl PdfForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();

            if name == "thumbnail" {
                let file_name = field.file_name().map(String::from);
                let content_type = field.content_type().map(String::from);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // Browsers send an empty part when no file was chosen
                if !bytes.is_empty() {
                    form.thumbnail = Some(ThumbnailUpload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field.text().await.map_err(multipart_error)?;
            match name.as_str() {
                "title" => form.title = Some(value),
                "description" => form.description = Some(value),
                "category" => form.category = Some(value),
                "tags" => form.tags = Some(value),
                "pdfLink" => form.pdf_link = Some(value),
                "isTrending" => form.is_trending = Some(parse_flag(&value)?),
                other => tracing::debug!(field = other, "Ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    async fn store_thumbnail(&mut self, state: &AppState) -> Result<Option<String>> {
        match self.thumbnail.take() {
            Some(upload) => state
                .thumbnails
                .put(upload.file_name.as_deref(), upload.content_type.as_deref(), &upload.bytes)
                .await
                .map(Some),
            None => Ok(None),
        }
    }
}

/// Best-effort cleanup of a thumbnail whose catalog write failed
async fn discard_thumbnail(state: &AppState, url: Option<&str>) {
    let Some(url) = url else { return };
    if let Err(e) = state.thumbnails.remove(url).await {
        tracing::warn!(url, error = %e, "Failed to remove orphaned thumbnail");
    }
}

/// Create an administrator account
pub async fn register(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    request.validate()?;
    let email = request.email.trim();

    if state.admins.find_admin_by_email(email).await?.is_some() {
        return Err(AppError::validation("Admin already exists"));
    }

    let password_hash = hash_password(&request.password)?;
    let admin = state.admins.create_admin(email, &password_hash).await?;
    metrics::record_admin_action("register");

    tracing::info!(admin_id = %admin.id, email = %admin.email, "Admin registered");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            success: true,
            message: "Admin registered successfully".to_string(),
        }),
    ))
}

/// Exchange credentials for a bearer token
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let admin = state
        .admins
        .find_admin_by_email(request.email.trim())
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(&request.password, &admin.password_hash) {
        tracing::warn!(email = %admin.email, "Failed admin login");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.jwt.generate_token(admin.id, &admin.email)?;
    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok(Json(LoginResponse {
        success: true,
        token,
        admin: AdminSummary {
            email: admin.email,
            id: admin.id,
        },
    }))
}

/// Register a new PDF link with optional thumbnail
pub async fn upload_pdf(
    State(state): State<AppState>,
    admin: AdminContext,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PdfResponse>)> {
    let mut form = PdfForm::read(multipart).await?;

    // Reject bad metadata before any thumbnail is written
    let new_pdf = NewPdf {
        title: form.title.take().unwrap_or_default(),
        description: form.description.take(),
        category: form.category.take(),
        tags: form.tags.as_deref().map(parse_tags).unwrap_or_default(),
        file_url: form.pdf_link.take().unwrap_or_default(),
        thumbnail: None,
    }
    .validated()?;

    let thumbnail = form.store_thumbnail(&state).await?;
    let record = match state.catalog.insert(NewPdf { thumbnail: thumbnail.clone(), ..new_pdf }).await {
        Ok(record) => record,
        Err(e) => {
            discard_thumbnail(&state, thumbnail.as_deref()).await;
            return Err(e);
        }
    };
    metrics::record_admin_action("upload");

    tracing::info!(
        admin_id = %admin.admin_id,
        pdf_id = %record.id,
        title = %record.title,
        "PDF uploaded"
    );

    Ok((StatusCode::CREATED, Json(record.into())))
}

/// Partially update a record; blank fields leave stored values alone
pub async fn edit_pdf(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<PdfResponse>> {
    let id = parse_pdf_id(&id)?;
    let mut form = PdfForm::read(multipart).await?;

    // 404 before touching thumbnail storage
    state.catalog.get_by_id(id).await?;
    let thumbnail = form.store_thumbnail(&state).await?;

    let patch = PdfPatch {
        title: form.title,
        description: form.description,
        category: form.category,
        tags: form
            .tags
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .map(parse_tags),
        file_url: form.pdf_link,
        thumbnail: thumbnail.clone(),
        is_trending: form.is_trending,
    };

    let record = match state.catalog.update(id, patch).await {
        Ok(record) => record,
        Err(e) => {
            discard_thumbnail(&state, thumbnail.as_deref()).await;
            return Err(e);
        }
    };
    metrics::record_admin_action("edit");

    tracing::info!(admin_id = %admin.admin_id, pdf_id = %id, "PDF edited");

    Ok(Json(record.into()))
}

/// Hard delete
pub async fn delete_pdf(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_pdf_id(&id)?;
    state.catalog.delete(id).await?;
    metrics::record_admin_action("delete");

    tracing::info!(admin_id = %admin.admin_id, pdf_id = %id, "PDF deleted");

    Ok(Json(MessageResponse {
        success: true,
        message: "PDF deleted successfully".to_string(),
    }))
}

pub async fn set_trending(
    State(state): State<AppState>,
    admin: AdminContext,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SetTrendingRequest>,
) -> Result<Json<PdfResponse>> {
    let id = parse_pdf_id(&id)?;
    let record = state.catalog.set_trending(id, request.is_trending).await?;
    metrics::record_admin_action("set_trending");

    tracing::info!(
        admin_id = %admin.admin_id,
        pdf_id = %id,
        is_trending = request.is_trending,
        "Trending flag set"
    );

    Ok(Json(record.into()))
}
