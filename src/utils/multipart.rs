use actix_multipart::{Field, Multipart};
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest};
use futures_util::StreamExt;

use crate::errors::AppError;
use crate::models::submission::{FormFields, ImageField};

#[derive(Debug, Clone)]
pub struct ReceivedFile {
    pub field: ImageField,
    pub original_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct ReceivedForm {
    pub fields: FormFields,
    pub files: Vec<ReceivedFile>,
}

impl ReceivedForm {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn file_summary(&self) -> String {
        self.files
            .iter()
            .map(|f| format!("{}={}B", f.field.form_name(), f.bytes.len()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Per-part size caps applied while the body is drained.
#[derive(Debug, Clone, Copy)]
pub struct IntakeLimits {
    pub max_file_bytes: usize,
    pub max_field_bytes: usize,
}

async fn drain(field: &mut Field) -> Result<(), AppError> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(|err| AppError::BadRequest(err.to_string()))?;
    }
    Ok(())
}

async fn read_capped(field: &mut Field, name: &str, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|err| AppError::BadRequest(err.to_string()))?;
        if bytes.len() + chunk.len() > limit {
            return Err(AppError::PayloadTooLarge { field: name.to_string(), limit });
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

fn is_multipart(req: &HttpRequest) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase().starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Drains a `multipart/form-data` body into memory. Bodies of any other content
/// type are treated as carrying no form data at all.
pub async fn read_submission(
    req: &HttpRequest,
    payload: web::Payload,
    limits: IntakeLimits,
) -> Result<ReceivedForm, AppError> {
    let mut form = ReceivedForm::default();
    if !is_multipart(req) {
        return Ok(form);
    }

    let mut multipart = Multipart::new(req.headers(), payload);
    while let Some(item) = multipart.next().await {
        let mut field = item.map_err(|err| AppError::BadRequest(format!("Malformed multipart body: {}", err)))?;

        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let filename = disposition.get_filename().map(str::to_string);

        match filename {
            // An unselected file input arrives as `filename=""` with no content.
            Some(original_name) if original_name.is_empty() => drain(&mut field).await?,
            Some(original_name) => {
                let image = ImageField::from_form_name(&name)
                    .ok_or_else(|| AppError::BadRequest(format!("Unexpected field: {}", name)))?;
                if form.files.iter().any(|f| f.field == image) {
                    return Err(AppError::BadRequest(format!("Unexpected field: {}", name)));
                }

                let bytes = read_capped(&mut field, &name, limits.max_file_bytes).await?;
                form.files.push(ReceivedFile {
                    field: image,
                    original_name: Some(original_name),
                    bytes,
                });
            }
            None => {
                let raw = read_capped(&mut field, &name, limits.max_field_bytes).await?;
                let value = String::from_utf8(raw)
                    .map_err(|_| AppError::BadRequest(format!("Field '{}' is not valid UTF-8", name)))?;
                form.fields.insert(name, value);
            }
        }
    }

    Ok(form)
}
