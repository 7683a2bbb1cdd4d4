use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use log::{error, info, warn};
use rand::Rng;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::submission::{ImageField, ImageLocations};
use crate::utils::multipart::ReceivedFile;

const FALLBACK_CONTENT_TYPE: &str = "image/jpeg";
const MAX_NAME_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub id: String,
    pub view_link: String,
    pub content_link: String,
}

/// External object storage holding uploaded images outside the database.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Creates a folder and returns its identifier.
    async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, AppError>;

    async fn upload_file(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
        folder_id: &str,
    ) -> Result<StoredObject, AppError>;
}

/// Writes uploads into a local directory under collision-free names.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    dir: PathBuf,
}

impl DiskStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| AppError::StorageError(format!("{}: {}", self.dir.display(), err)))
    }

    /// Writes the file and returns its path relative to the working directory,
    /// e.g. `uploads/staffPhoto-1718000000000-123456789.jpg`.
    pub async fn save(&self, file: &ReceivedFile) -> Result<String, AppError> {
        let ext = extension_of(file.original_name.as_deref());

        for _ in 0..MAX_NAME_ATTEMPTS {
            let name = unique_file_name(file.field.form_name(), &ext);
            let path = self.dir.join(&name);

            let mut handle = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(handle) => handle,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(AppError::StorageError(format!("{}: {}", path.display(), err)))
                }
            };

            handle
                .write_all(&file.bytes)
                .await
                .map_err(|err| AppError::StorageError(format!("{}: {}", path.display(), err)))?;
            handle
                .flush()
                .await
                .map_err(|err| AppError::StorageError(format!("{}: {}", path.display(), err)))?;

            return Ok(path.display().to_string());
        }

        Err(AppError::StorageError(format!(
            "could not find a free file name for {}",
            file.field.form_name()
        )))
    }
}

/// `{field}-{unix millis}-{random below 1e9}{ext}`
pub fn unique_file_name(field: &str, ext: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    format!("{}-{}-{}{}", field, Utc::now().timestamp_millis(), suffix, ext)
}

/// Extension of the client's file name including the dot, or empty.
pub fn extension_of(original_name: Option<&str>) -> String {
    original_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}

pub fn sniff_content_type(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}

#[derive(Clone)]
pub enum UploadTarget {
    Disk(DiskStorage),
    Object {
        storage: Arc<dyn ObjectStorage>,
        root_folder: Option<String>,
    },
}

impl UploadTarget {
    /// Stores every received file and reports where each one went.
    ///
    /// Disk failures abort the submission. Object-storage failures only leave the
    /// affected image columns empty; the row is still inserted.
    pub async fn persist(
        &self,
        files: &[ReceivedFile],
        label: &str,
    ) -> Result<ImageLocations, AppError> {
        let mut locations = ImageLocations::default();
        if files.is_empty() {
            return Ok(locations);
        }

        match self {
            UploadTarget::Disk(disk) => {
                for file in files {
                    let path = disk.save(file).await.map_err(|err| {
                        error!("Failed to store {}: {}", file.field.form_name(), err);
                        err
                    })?;
                    locations.set(file.field, path);
                }
            }
            UploadTarget::Object { storage, root_folder } => {
                let folder_name = format!("{}-{}", label, Uuid::new_v4());
                let folder_id = match storage.create_folder(&folder_name, root_folder.as_deref()).await {
                    Ok(id) => id,
                    Err(err) => {
                        warn!("Skipping image upload, folder {} not created: {}", folder_name, err);
                        return Ok(locations);
                    }
                };

                for file in files {
                    let content_type = sniff_content_type(&file.bytes);
                    let file_name = format!(
                        "{}{}",
                        file.field.form_name(),
                        extension_of(file.original_name.as_deref())
                    );
                    match storage
                        .upload_file(&file_name, content_type, file.bytes.clone(), &folder_id)
                        .await
                    {
                        Ok(stored) => {
                            info!("Uploaded {} as {} ({})", file.field.form_name(), stored.id, stored.content_link);
                            locations.set(file.field, stored.view_link);
                        }
                        Err(err) => warn!("Upload of {} failed: {}", file.field.form_name(), err),
                    }
                }
            }
        }

        Ok(locations)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use tokio::sync::Mutex;

    /// Records folders and uploads in memory; can be told to fail either step.
    #[derive(Default)]
    pub struct FakeObjectStorage {
        pub folders: Mutex<Vec<(String, Option<String>)>>,
        pub uploads: Mutex<Vec<(String, String, usize, String)>>,
        pub fail_folder: bool,
        pub fail_upload_of: Option<String>,
    }

    #[async_trait]
    impl ObjectStorage for FakeObjectStorage {
        async fn create_folder(&self, name: &str, parent: Option<&str>) -> Result<String, AppError> {
            if self.fail_folder {
                return Err(AppError::AWSError("folder refused".to_string()));
            }
            self.folders
                .lock()
                .await
                .push((name.to_string(), parent.map(str::to_string)));
            Ok(format!("{}/", name))
        }

        async fn upload_file(
            &self,
            file_name: &str,
            content_type: &str,
            bytes: Vec<u8>,
            folder_id: &str,
        ) -> Result<StoredObject, AppError> {
            if self.fail_upload_of.as_deref() == Some(file_name) {
                return Err(AppError::AWSError("upload refused".to_string()));
            }
            let id = format!("{}{}", folder_id, file_name);
            self.uploads.lock().await.push((
                file_name.to_string(),
                content_type.to_string(),
                bytes.len(),
                folder_id.to_string(),
            ));
            Ok(StoredObject {
                view_link: format!("https://cdn.example/{}", id),
                content_link: format!("s3://bucket/{}", id),
                id,
            })
        }
    }

    fn received(field: ImageField, name: &str, bytes: &[u8]) -> ReceivedFile {
        ReceivedFile {
            field,
            original_name: Some(name.to_string()),
            bytes: bytes.to_vec(),
        }
    }

    #[test]
    fn names_generated_in_one_millisecond_do_not_collide() {
        let names: HashSet<String> = (0..200).map(|_| unique_file_name("staffPhoto", ".jpg")).collect();
        assert_eq!(names.len(), 200);
        assert!(names.iter().all(|n| n.starts_with("staffPhoto-") && n.ends_with(".jpg")));
    }

    #[test]
    fn extension_comes_from_client_name() {
        assert_eq!(extension_of(Some("photo.PNG")), ".PNG");
        assert_eq!(extension_of(Some("archive.tar.gz")), ".gz");
        assert_eq!(extension_of(Some("noext")), "");
        assert_eq!(extension_of(Some("bad.j/pg")), "");
        assert_eq!(extension_of(None), "");
    }

    #[test]
    fn content_type_falls_back_to_jpeg() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_content_type(&png), "image/png");
        assert_eq!(sniff_content_type(b"plain bytes"), "image/jpeg");
    }

    #[tokio::test]
    async fn disk_target_writes_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = UploadTarget::Disk(DiskStorage::new(dir.path()));
        let files = vec![
            received(ImageField::StaffPhoto, "me.jpg", b"one"),
            received(ImageField::CitizenBack, "back.png", b"two"),
        ];

        let locations = target.persist(&files, "ignored").await.unwrap();
        let staff = locations.staff_photo.clone().unwrap();
        assert!(staff.contains("staffPhoto-") && staff.ends_with(".jpg"));
        assert_eq!(std::fs::read(&staff).unwrap(), b"one");
        assert!(locations.citizen_front.is_none());
        assert_eq!(
            std::fs::read(locations.citizen_back.unwrap()).unwrap(),
            b"two"
        );
    }

    #[tokio::test]
    async fn concurrent_disk_saves_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let disk = DiskStorage::new(dir.path());
        let file = received(ImageField::CitizenFront, "id.jpg", b"x");

        let mut handles = Vec::new();
        for _ in 0..32 {
            let disk = disk.clone();
            let file = file.clone();
            handles.push(tokio::spawn(async move { disk.save(&file).await.unwrap() }));
        }
        let mut paths = HashSet::new();
        for handle in handles {
            paths.insert(handle.await.unwrap());
        }
        assert_eq!(paths.len(), 32);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 32);
    }

    #[tokio::test]
    async fn object_target_uses_one_folder_per_submission() {
        let fake = Arc::new(FakeObjectStorage::default());
        let target = UploadTarget::Object {
            storage: fake.clone(),
            root_folder: Some("onboarding".to_string()),
        };
        let files = vec![
            received(ImageField::StaffPhoto, "me.jpg", b"one"),
            received(ImageField::CitizenFront, "front.jpg", b"two"),
        ];

        let locations = target.persist(&files, "Nguyen_Van_A").await.unwrap();

        let folders = fake.folders.lock().await;
        assert_eq!(folders.len(), 1);
        assert!(folders[0].0.starts_with("Nguyen_Van_A-"));
        assert_eq!(folders[0].1.as_deref(), Some("onboarding"));

        let uploads = fake.uploads.lock().await;
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].0, "staffPhoto.jpg");
        assert_eq!(uploads[0].1, "image/jpeg");
        assert!(locations.staff_photo.unwrap().starts_with("https://cdn.example/Nguyen_Van_A-"));
        assert!(locations.citizen_front.is_some());
    }

    #[tokio::test]
    async fn object_failures_leave_columns_empty() {
        let fake = Arc::new(FakeObjectStorage {
            fail_upload_of: Some("citizenBack.jpg".to_string()),
            ..Default::default()
        });
        let target = UploadTarget::Object { storage: fake, root_folder: None };
        let files = vec![
            received(ImageField::StaffPhoto, "me.jpg", b"one"),
            received(ImageField::CitizenBack, "back.jpg", b"two"),
        ];
        let locations = target.persist(&files, "x").await.unwrap();
        assert!(locations.staff_photo.is_some());
        assert!(locations.citizen_back.is_none());

        let broken = UploadTarget::Object {
            storage: Arc::new(FakeObjectStorage { fail_folder: true, ..Default::default() }),
            root_folder: None,
        };
        let locations = broken.persist(&files, "x").await.unwrap();
        assert_eq!(locations, ImageLocations::default());
    }
}
