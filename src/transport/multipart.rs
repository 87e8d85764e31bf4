//! Hand-built `multipart/form-data` bodies.
//!
//! Layout per part: `--{boundary}\r\n`, headers each ending in CRLF, a blank line,
//! the content and a trailing CRLF. The body ends with `--{boundary}--\r\n`.

use uuid::Uuid;

/// Fresh boundary token, unique per request.
pub fn new_boundary() -> String {
    format!("-------------{}", Uuid::new_v4().simple())
}

pub fn content_type(boundary: &str) -> String {
    format!("multipart/form-data; boundary={}", boundary)
}

/// A file part whose bytes are already in memory.
#[derive(Debug, Clone, Copy)]
pub struct EncodedFile<'a> {
    pub name: &'a str,
    pub file_name: &'a str,
    pub content_type: &'a str,
    pub content: &'a [u8],
}

/// Encode text fields first, then files, in the given order.
pub fn encode(boundary: &str, fields: &[(String, String)], files: &[EncodedFile<'_>]) -> Vec<u8> {
    let mut out = Vec::new();

    for (name, value) in fields {
        out.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        out.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
        );
        out.extend_from_slice(value.as_bytes());
        out.extend_from_slice(b"\r\n");
    }

    for file in files {
        out.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
        out.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                file.name, file.file_name
            )
            .as_bytes(),
        );
        out.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
        out.extend_from_slice(file.content);
        out.extend_from_slice(b"\r\n");
    }

    out.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());
    out
}
