use async_trait::async_trait;
use log::error;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::submission::NewSubmission;

// Column names are quoted because the table was created with case-sensitive names.
pub const INSERT_SUBMISSION: &str = r#"
    INSERT INTO hrminfo (
        "Ho_Va_Ten", "Gioi_Tinh", "Ngay_Thang_Nam_Sinh", "Hinh_Thuc_Cong_Viec", "Ngay_Bat_Dau_Lam_Viec",
        "Hinh_Thuc_Lam_Viec", "Chuc_Vu", "Phong_Ban", "Thuong_Hieu", "Noi_Lam_Viec", "Ten_Nganh",
        "Ten_Truong", "So_Dien_Thoai", "Email", "Link_Facebook", "So_Tai_Khoan_VPBank",
        "Chu_Tai_Khoan_VPBank", "Chi_Nhanh_VPBank", "So_Can_Cuoc_Cong_Dan", "Dia_Chi_Thuong_Tru",
        "Dia_Chi_Hien_Tai", "Anh_The_Nhan_Vien_Link", "Anh_CCCD_Mat_Truoc_Link", "Anh_CCCD_Mat_Sau_Link",
        "Bien_So_Xe", "Tham_Gia_Nhom_Rieng", "Cam_Doan"
    ) VALUES (
        $1, $2, $3::date, $4, $5::date, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
        $18, $19, $20, $21, $22, $23, $24, $25, $26::smallint, $27
    ) RETURNING "id"::bigint
"#;

pub async fn create_pool(database_url: &str) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|err| AppError::DatabaseError(err.to_string()))
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Inserts one submission row and returns its generated id.
    async fn insert(&self, submission: &NewSubmission) -> Result<i64, AppError>;
}

pub struct PgSubmissionStore {
    pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn insert(&self, submission: &NewSubmission) -> Result<i64, AppError> {
        let mut query = sqlx::query_scalar::<_, i64>(INSERT_SUBMISSION);
        for value in submission.column_values() {
            query = query.bind(value);
        }

        query.fetch_one(&self.pool).await.map_err(|err| {
            error!("Database Error: {:?}", err);
            AppError::DatabaseError(err.to_string())
        })
    }
}
