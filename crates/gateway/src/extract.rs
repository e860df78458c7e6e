//! Request extractors reporting failures in the shared error envelope

use axum::extract::FromRequest;
use pdfhub_common::errors::{AppError, Result};
use uuid::Uuid;

/// JSON body whose rejections become `AppError` responses
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Record identifiers that are not UUIDs cannot name a record
pub fn parse_pdf_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::PdfNotFound { id: raw.to_string() })
}
