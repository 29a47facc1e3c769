//! Plain-data descriptions of a call and of the HTTP answer to it.
//!
//! # Design
//! `ApiCall` is what the `Client::build_*` methods produce: the remote
//! method name, its form fields and any files to upload. Whether a call is
//! sent URL-encoded or as multipart is decided by `ApiCall::is_multipart`.
//! `HttpResponse` is what a `Transport` hands back; it carries the status
//! line and the raw body so the envelope codec can run without a network.

use std::path::{Path, PathBuf};

use crate::params::Params;

/// A local file uploaded as one part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub field: String,
    pub path: PathBuf,
}

impl Attachment {
    pub fn new(field: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            field: field.into(),
            path: path.into(),
        }
    }

    /// Part filename: the last path component, or the whole path if there
    /// is none.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One remote call, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCall {
    pub method: String,
    /// `None` sends no body at all.
    pub params: Option<Params>,
    pub attachments: Vec<Attachment>,
}

impl ApiCall {
    pub fn new(method: impl Into<String>, params: Option<Params>) -> Self {
        Self {
            method: method.into(),
            params,
            attachments: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn is_multipart(&self) -> bool {
        !self.attachments.is_empty()
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.as_ref().and_then(|params| params.get(key))
    }
}

/// Body handed to a `Transport`.
pub enum RequestBody<'a> {
    Empty,
    Bytes(&'a [u8]),
    /// Read until EOF while the request is in flight.
    Stream(&'a mut dyn std::io::Read),
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub reason: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: String::new(),
            body: body.into(),
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attachment_file_name_is_base_name() {
        let attachment = Attachment::new("sticker", "/tmp/stickers/a.webp");
        assert_eq!(attachment.file_name(), "a.webp");
    }

    #[test]
    fn call_without_attachments_is_urlencoded() {
        let call = ApiCall::new("getMe", None);
        assert!(!call.is_multipart());
        assert_eq!(call.param("chat_id"), None);

        let call = call.with_attachment(Attachment::new("sticker", "a.webp"));
        assert!(call.is_multipart());
    }

    #[test]
    fn success_range_is_2xx() {
        assert!(HttpResponse::new(200, "").is_success());
        assert!(HttpResponse::new(299, "").is_success());
        assert!(!HttpResponse::new(199, "").is_success());
        assert!(!HttpResponse::new(300, "").is_success());
        assert!(!HttpResponse::new(500, "").is_success());
    }
}
