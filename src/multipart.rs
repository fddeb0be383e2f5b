//! `multipart/form-data` body with a single file field.
//!
//! The body is streamed, but its total length is known up front so the
//! request can carry an exact `Content-Length` instead of chunked encoding.

use std::io::{Cursor, Read};
use uuid::Uuid;

/// Form field the service reads the file from.
pub const FILE_FIELD: &str = "file";

/// A multipart form wrapping one file part.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    preamble: Vec<u8>,
    epilogue: Vec<u8>,
    file_size: u64,
}

impl MultipartForm {
    /// Frame a file of `file_size` bytes declared as `filename`.
    pub fn new(filename: &str, file_size: u64) -> Self {
        let boundary = format!("{}{}", "-".repeat(24), Uuid::new_v4().simple());
        MultipartForm::with_boundary(boundary, filename, file_size)
    }

    fn with_boundary(boundary: String, filename: &str, file_size: u64) -> Self {
        let preamble = format!(
            "--{boundary}\r\n\
             Content-Disposition: form-data; name=\"{FILE_FIELD}\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\
             \r\n",
            escape_filename(filename),
        )
        .into_bytes();
        let epilogue = format!("\r\n--{boundary}--\r\n").into_bytes();

        MultipartForm {
            boundary,
            preamble,
            epilogue,
            file_size,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Total encoded length: framing plus the file itself.
    pub fn content_length(&self) -> u64 {
        self.preamble.len() as u64 + self.file_size + self.epilogue.len() as u64
    }

    /// Stream the full body around `file`, which must yield exactly the
    /// declared number of bytes.
    pub fn into_reader<R: Read>(self, file: R) -> impl Read {
        Cursor::new(self.preamble)
            .chain(file.take(self.file_size))
            .chain(Cursor::new(self.epilogue))
    }
}

/// Quote-safe filename, escaped the way browsers do for form submissions.
fn escape_filename(name: &str) -> String {
    name.replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
