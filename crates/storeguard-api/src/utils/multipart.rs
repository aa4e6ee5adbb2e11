//! Multipart upload form extraction

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use bytes::Bytes;
use storeguard_core::AppError;
use storeguard_processing::IncomingFile;

/// Longest accepted text field
const MAX_TEXT_FIELD_BYTES: usize = 4 * 1024;

/// Parsed upload form
///
/// `text_fields` keeps every non-file field in arrival order for inspection.
#[derive(Debug)]
pub struct UploadForm {
    pub file: IncomingFile,
    pub text_fields: Vec<(String, String)>,
}

impl UploadForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text_fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Read the form. A missing `file` field yields an empty `IncomingFile`, which the intake
/// policy rejects as `NoFile`; more than one `file` field is a bad request.
pub async fn extract_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut file: Option<IncomingFile> = None;
    let mut text_fields = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string).unwrap_or_default();

        if name == "file" {
            if file.is_some() {
                return Err(AppError::BadRequest(
                    "Multiple file fields are not allowed; send exactly one field named 'file'"
                        .to_string(),
                ));
            }
            let filename = field.file_name().map(str::to_string);
            let declared_content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(multipart_error)?;

            file = Some(IncomingFile {
                filename,
                declared_content_type,
                data,
            });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            if value.len() > MAX_TEXT_FIELD_BYTES {
                return Err(AppError::BadRequest(format!(
                    "Form field '{}' is too long",
                    name
                )));
            }
            text_fields.push((name, value));
        }
    }

    Ok(UploadForm {
        file: file.unwrap_or(IncomingFile {
            filename: None,
            declared_content_type: None,
            data: Bytes::new(),
        }),
        text_fields,
    })
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Request body exceeds the upload limit".to_string())
    } else {
        AppError::BadRequest(format!("Failed to read multipart body: {}", err.body_text()))
    }
}
