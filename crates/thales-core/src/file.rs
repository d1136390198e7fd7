//! Uploaded file payloads.

use bytes::Bytes;

/// A file received as one part of a `multipart/form-data` body.
///
/// File-valued properties receive these directly; they never pass through
/// string conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    field_name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl UploadedFile {
    /// Creates a new uploaded file.
    #[must_use]
    pub fn new(field_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            field_name: field_name.into(),
            file_name: None,
            content_type: None,
            data: data.into(),
        }
    }

    /// Sets the client-supplied file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Sets the part's content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the form field name the file was sent under.
    #[must_use]
    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    /// Returns the client-supplied file name.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Returns the part's content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns the file contents.
    #[must_use]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns the size of the file in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the file is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
