use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, error, info};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::submission::{ImageField, ImageLocations, NewSubmission};
use crate::state::AppState;
use crate::utils::multipart::read_submission;

#[derive(Serialize)]
struct SubmissionResponse {
    success: bool,
    message: &'static str,
    id: i64,
}

/// `POST /hrminfo`: stores the images, then inserts the intake row.
///
/// A body without any text fields is refused before anything is written.
pub async fn create_submission(
    req: HttpRequest,
    payload: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let form = read_submission(&req, payload, state.limits).await?;
    info!(
        "Received data at /hrminfo: {} text fields, files [{}]",
        form.fields.len(),
        form.file_summary()
    );
    debug!("Text fields: {:?}", form.fields);

    if form.is_empty() {
        return Err(AppError::EmptyBody);
    }

    let mut submission = NewSubmission::from_form(&form.fields, ImageLocations::default());
    submission.images = state
        .uploads
        .persist(&form.files, &submission.folder_label())
        .await?;
    for field in ImageField::ALL {
        if let Some(location) = submission.images.get(field) {
            debug!("{} stored at {}", field.form_name(), location);
        }
    }

    let id = state.store.insert(&submission).await.map_err(|err| {
        error!("Insert into hrminfo failed: {}", err);
        err
    })?;
    info!("Stored submission {}", id);

    Ok(HttpResponse::Created().json(SubmissionResponse {
        success: true,
        message: "Information saved successfully!",
        id,
    }))
}
