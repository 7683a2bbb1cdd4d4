pub mod multipart;
pub mod s3;
pub mod storage;
