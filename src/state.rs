use std::sync::Arc;

use crate::db::SubmissionStore;
use crate::utils::multipart::IntakeLimits;
use crate::utils::storage::UploadTarget;

/// Shared by every worker through `web::Data`.
pub struct AppState {
    pub store: Arc<dyn SubmissionStore>,
    pub uploads: UploadTarget,
    pub limits: IntakeLimits,
}
