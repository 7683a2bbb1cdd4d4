use std::io::ErrorKind;

use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::state::AppState;
use crate::utils::storage::UploadTarget;

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c: char| c == '/' || c == '\\') && !name.contains("..")
}

/// `GET /uploads/{filename}`: serves images written by the disk backend.
pub async fn serve_upload(
    filename: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let filename = filename.into_inner();
    let disk = match &state.uploads {
        UploadTarget::Disk(disk) => disk,
        UploadTarget::Object { .. } => return Err(AppError::NotFound(filename)),
    };
    if !is_plain_file_name(&filename) {
        return Err(AppError::NotFound(filename));
    }

    let bytes = match tokio::fs::read(disk.dir().join(&filename)).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Err(AppError::NotFound(filename)),
        Err(err) => return Err(AppError::StorageError(err.to_string())),
    };

    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");
    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}
