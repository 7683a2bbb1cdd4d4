mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod state;
mod utils;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{error, info};

use config::{Config, UploadBackend};
use db::PgSubmissionStore;
use errors::AppError;
use state::AppState;
use utils::multipart::IntakeLimits;
use utils::s3::{create_s3_client, S3ObjectStorage};
use utils::storage::{DiskStorage, UploadTarget};

async fn upload_target(config: &Config) -> Result<UploadTarget, AppError> {
    match (&config.upload_backend, &config.s3) {
        (UploadBackend::S3, Some(settings)) => {
            let client = create_s3_client(settings.region.clone()).await;
            let storage = S3ObjectStorage::new(client, settings)?;
            info!("Uploads go to s3://{}", settings.bucket);
            Ok(UploadTarget::Object {
                storage: Arc::new(storage),
                root_folder: settings.root_folder.clone(),
            })
        }
        (UploadBackend::S3, None) => Err(AppError::ConfigError(
            "s3 backend selected without bucket settings".to_string(),
        )),
        (UploadBackend::Disk, _) => {
            let disk = DiskStorage::new(&config.upload_dir);
            disk.ensure_dir().await?;
            info!("Uploads go to {}", disk.dir().display());
            Ok(UploadTarget::Disk(disk))
        }
    }
}

async fn build_state(config: &Config) -> Result<AppState, AppError> {
    let pool = db::create_pool(&config.database_url).await?;
    Ok(AppState {
        store: Arc::new(PgSubmissionStore::new(pool)),
        uploads: upload_target(config).await?,
        limits: IntakeLimits {
            max_file_bytes: config.max_file_bytes,
            max_field_bytes: config.max_field_bytes,
        },
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(|err| {
        error!("{}", err);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string())
    })?;
    let state = web::Data::new(build_state(&config).await.map_err(|err| {
        error!("Startup failed: {}", err);
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    })?);

    let (host, port) = config.bind_addr();
    info!("Server is running on http://{}:{}", host, port);

    let allowed_origins = config.allowed_origins.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(handlers::cors_policy(&allowed_origins))
            .wrap(actix_web::middleware::Logger::default())
            .configure(handlers::routes)
    })
    .bind((host, port))?
    .run()
    .await
}
