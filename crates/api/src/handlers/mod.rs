pub mod batches;
pub mod images;
pub mod preview;
pub mod sessions;

use axum::extract::Multipart;
use batchtone_engine::uploads::UploadFile;

use crate::error::{AppError, AppResult};

/// Collect every file part of a multipart body. Parts without a file name
/// (plain form fields) are ignored.
pub(crate) async fn read_upload_files(multipart: &mut Multipart) -> AppResult<Vec<UploadFile>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        files.push(UploadFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Ok(files)
}
