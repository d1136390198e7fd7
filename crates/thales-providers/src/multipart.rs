//! Multipart form data reading.
//!
//! `multipart/form-data` bodies are read completely into a [`FormData`]:
//! text parts become form fields, parts with a file name become
//! [`UploadedFile`]s.

use bytes::Bytes;
use std::io;
use thales_core::{BindError, SourceId, UploadedFile};

/// Default maximum total body size for multipart (50 MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 50 * 1024 * 1024;

/// Default maximum size per part (10 MB).
pub const DEFAULT_MAX_FIELD_SIZE: usize = 10 * 1024 * 1024;

/// Default maximum number of parts.
pub const DEFAULT_MAX_FIELDS: usize = 100;

/// Limits applied while reading multipart bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartLimits {
    /// Maximum total body size in bytes.
    pub max_body_size: usize,
    /// Maximum size per part in bytes.
    pub max_field_size: usize,
    /// Maximum number of parts.
    pub max_fields: usize,
}

impl Default for MultipartLimits {
    fn default() -> Self {
        Self {
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            max_field_size: DEFAULT_MAX_FIELD_SIZE,
            max_fields: DEFAULT_MAX_FIELDS,
        }
    }
}

impl MultipartLimits {
    /// Set the maximum body size.
    #[must_use]
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set the maximum part size.
    #[must_use]
    pub fn max_field_size(mut self, size: usize) -> Self {
        self.max_field_size = size;
        self
    }

    /// Set the maximum number of parts.
    #[must_use]
    pub fn max_fields(mut self, count: usize) -> Self {
        self.max_fields = count;
        self
    }
}

/// Text fields and files read from a form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    /// Text fields as `(name, value)` pairs in body order.
    pub fields: Vec<(String, String)>,
    /// Uploaded files in body order.
    pub files: Vec<UploadedFile>,
}

fn malformed(reason: impl Into<String>) -> BindError {
    BindError::body_parse(SourceId::Form, reason)
}

/// Reads a whole `multipart/form-data` body.
///
/// # Errors
///
/// Returns [`BindError::BodyParse`] for a missing boundary or a malformed
/// body, and [`BindError::PayloadTooLarge`] when a limit is exceeded.
pub async fn read_multipart(
    content_type: &str,
    body: Bytes,
    limits: &MultipartLimits,
) -> Result<FormData, BindError> {
    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| malformed("missing or invalid boundary in multipart Content-Type"))?;

    if body.len() > limits.max_body_size {
        return Err(BindError::payload_too_large(
            SourceId::Form,
            limits.max_body_size,
            body.len(),
        ));
    }

    let stream = futures_util::stream::once(async move { Ok::<_, io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);
    let mut form = FormData::default();
    let mut count = 0usize;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| malformed(format!("multipart parse error: {e}")))?
    {
        count += 1;
        if count > limits.max_fields {
            return Err(malformed(format!(
                "too many multipart fields (max {})",
                limits.max_fields
            )));
        }

        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(ToString::to_string);

        let data = field
            .bytes()
            .await
            .map_err(|e| malformed(format!("failed to read field '{name}': {e}")))?;

        if data.len() > limits.max_field_size {
            return Err(BindError::payload_too_large(
                SourceId::Form,
                limits.max_field_size,
                data.len(),
            ));
        }

        match file_name {
            Some(file_name) => {
                let mut file = UploadedFile::new(name, data).with_file_name(file_name);
                if let Some(content_type) = content_type {
                    file = file.with_content_type(content_type);
                }
                form.files.push(file);
            }
            None => {
                let text = String::from_utf8(data.to_vec())
                    .map_err(|e| malformed(format!("field '{name}' is not valid UTF-8: {e}")))?;
                form.fields.push((name, text));
            }
        }
    }

    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTENT_TYPE: &str = "multipart/form-data; boundary=X-BOUNDARY";

    fn body() -> Bytes {
        Bytes::from_static(
            b"--X-BOUNDARY\r\n\
Content-Disposition: form-data; name=\"title\"\r\n\
\r\n\
Quarterly report\r\n\
--X-BOUNDARY\r\n\
Content-Disposition: form-data; name=\"attachment\"; filename=\"report.txt\"\r\n\
Content-Type: text/plain\r\n\
\r\n\
file contents\r\n\
--X-BOUNDARY--\r\n",
        )
    }

    #[tokio::test]
    async fn test_reads_fields_and_files() {
        let form = read_multipart(CONTENT_TYPE, body(), &MultipartLimits::default())
            .await
            .unwrap();

        assert_eq!(form.fields, vec![("title".to_string(), "Quarterly report".to_string())]);
        assert_eq!(form.files.len(), 1);

        let file = &form.files[0];
        assert_eq!(file.field_name(), "attachment");
        assert_eq!(file.file_name(), Some("report.txt"));
        assert_eq!(file.content_type(), Some("text/plain"));
        assert_eq!(&file.data()[..], b"file contents");
    }

    #[tokio::test]
    async fn test_missing_boundary() {
        let err = read_multipart("multipart/form-data", body(), &MultipartLimits::default())
            .await
            .unwrap_err();

        assert!(matches!(err, BindError::BodyParse { .. }));
    }

    #[tokio::test]
    async fn test_body_too_large() {
        let limits = MultipartLimits::default().max_body_size(10);
        let err = read_multipart(CONTENT_TYPE, body(), &limits).await.unwrap_err();

        assert!(matches!(err, BindError::PayloadTooLarge { max_size: 10, .. }));
    }

    #[tokio::test]
    async fn test_field_too_large() {
        let limits = MultipartLimits::default().max_field_size(4);
        let err = read_multipart(CONTENT_TYPE, body(), &limits).await.unwrap_err();

        assert!(matches!(err, BindError::PayloadTooLarge { max_size: 4, .. }));
    }

    #[tokio::test]
    async fn test_too_many_fields() {
        let limits = MultipartLimits::default().max_fields(1);
        let err = read_multipart(CONTENT_TYPE, body(), &limits).await.unwrap_err();

        assert!(err.to_string().contains("too many multipart fields"));
    }
}
