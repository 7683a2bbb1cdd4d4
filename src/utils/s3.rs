use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::ConfigLoader;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use aws_types::region::Region;
use url::Url;

use crate::config::S3Settings;
use crate::errors::AppError;
use crate::utils::storage::{ObjectStorage, StoredObject};

pub async fn create_s3_client(region: Option<String>) -> S3Client {
    let aws_config = ConfigLoader::default()
        .region(region.map(Region::new))
        .behavior_version(BehaviorVersion::latest())
        .load()
        .await;

    S3Client::new(&aws_config)
}

/// Object storage on an S3 bucket. Folders are zero-byte objects whose key ends in `/`.
pub struct S3ObjectStorage {
    client: S3Client,
    bucket: String,
    public_base: Url,
}

impl S3ObjectStorage {
    pub fn new(client: S3Client, settings: &S3Settings) -> Result<Self, AppError> {
        let public_base = public_base_url(settings)?;
        Ok(Self {
            client,
            bucket: settings.bucket.clone(),
            public_base,
        })
    }

    fn view_link(&self, key: &str) -> Result<String, AppError> {
        self.public_base
            .join(key)
            .map(String::from)
            .map_err(|err| AppError::AWSError(format!("invalid object key {}: {}", key, err)))
    }
}

/// Base for browser-facing links, always ending in `/` so keys join underneath it.
fn public_base_url(settings: &S3Settings) -> Result<Url, AppError> {
    let raw = match &settings.public_base_url {
        Some(base) => base.clone(),
        None => match &settings.region {
            Some(region) => format!("https://{}.s3.{}.amazonaws.com", settings.bucket, region),
            None => format!("https://{}.s3.amazonaws.com", settings.bucket),
        },
    };
    let raw = if raw.ends_with('/') { raw } else { format!("{}/", raw) };
    Url::parse(&raw).map_err(|err| AppError::ConfigError(format!("invalid S3_PUBLIC_BASE_URL {}: {}", raw, err)))
}

fn folder_key(name: &str, parent: Option<&str>) -> String {
    match parent.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        Some(parent) => format!("{}/{}/", parent, name),
        None => format!("{}/", name),
    }
}

#[async_trait]
impl ObjectStorage for S3ObjectStorage {
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, AppError> {
        let key = folder_key(name, parent);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(Vec::<u8>::new()))
            .send()
            .await
            .map_err(|err| AppError::AWSError(DisplayErrorContext(&err).to_string()))?;
        Ok(key)
    }

    async fn upload_file(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        folder_id: &str,
    ) -> Result<StoredObject, AppError> {
        let key = format!("{}{}", folder_id, file_name);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| AppError::AWSError(DisplayErrorContext(&err).to_string()))?;

        Ok(StoredObject {
            view_link: self.view_link(&key)?,
            content_link: format!("s3://{}/{}", self.bucket, key),
            id: key,
        })
    }
}
