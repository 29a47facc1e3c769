//! Streaming `multipart/form-data` uploads.
//!
//! # Design
//! The body is encoded by `common_multipart_rfc7578` and never assembled in
//! memory. The calling thread drains the encoder into a `pipe` while a
//! scoped thread hands the other end to the `Transport` as a streaming body.
//! The calling thread joins the sender before looking at any result, so a
//! response can never be observed while the body is still being produced,
//! and an error from either side is returned rather than lost with the
//! thread.
//!
//! Every attachment is checked before the request starts; a path that
//! cannot be read fails the call without touching the network. While
//! streaming, each file is opened when its part begins and closed when it
//! ends.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;

use common_multipart_rfc7578::client::multipart::{Body, BoundaryGenerator, Form};
use futures::executor::block_on_stream;
use uuid::Uuid;

use crate::error::ApiError;
use crate::http::{Attachment, HttpResponse, RequestBody};
use crate::logger::Logger;
use crate::params::Params;
use crate::pipe::{pipe, PipeWriter};
use crate::transport::Transport;

/// Unread chunks allowed between producer and sender.
const PIPE_CAPACITY: usize = 8;

/// Boundaries from random v4 uuids.
pub struct UuidBoundary;

impl BoundaryGenerator for UuidBoundary {
    fn generate_boundary() -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// First file error hit while the encoder was reading attachments.
type ReadFailure = Arc<Mutex<Option<ApiError>>>;

/// Attachment contents for the encoder. Opens the file on first read and
/// closes it at end of file.
struct AttachmentReader {
    path: PathBuf,
    file: Option<File>,
    finished: bool,
    failure: ReadFailure,
}

impl AttachmentReader {
    fn new(path: PathBuf, failure: ReadFailure) -> Self {
        Self {
            path,
            file: None,
            finished: false,
            failure,
        }
    }

    fn fail(&self, source: io::Error) -> io::Error {
        let err = io::Error::new(source.kind(), source.to_string());
        if let Ok(mut slot) = self.failure.lock() {
            if slot.is_none() {
                *slot = Some(ApiError::FileError {
                    path: self.path.clone(),
                    source,
                });
            }
        }
        err
    }
}

impl Read for AttachmentReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.finished {
            return Ok(0);
        }
        if self.file.is_none() {
            let file = File::open(&self.path).map_err(|source| self.fail(source))?;
            self.file = Some(file);
        }
        let read = match self.file.as_mut() {
            Some(file) => file.read(buf),
            None => Ok(0),
        };
        let n = read.map_err(|source| self.fail(source))?;
        if n == 0 {
            self.file = None;
            self.finished = true;
        }
        Ok(n)
    }
}

/// Part and file names go inside a quoted header parameter; `"`, CR and LF
/// are percent-encoded the way browsers encode them.
fn header_safe(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Check every attachment can be opened for reading.
pub fn check_attachments(attachments: &[Attachment]) -> Result<(), ApiError> {
    for attachment in attachments {
        File::open(&attachment.path).map_err(|source| ApiError::FileError {
            path: attachment.path.clone(),
            source,
        })?;
    }
    Ok(())
}

/// Plain fields first, then every attachment in order.
fn build_form<G: BoundaryGenerator>(
    params: &Params,
    attachments: &[Attachment],
    failure: &ReadFailure,
) -> Form<'static> {
    let mut form = Form::new::<G>();
    for (name, value) in params.iter() {
        form.add_text(header_safe(name), value.to_string());
    }
    for attachment in attachments {
        let mime = mime_guess::from_path(&attachment.path).first_or_octet_stream();
        form.add_reader_file_with_mime(
            header_safe(&attachment.field),
            AttachmentReader::new(attachment.path.clone(), failure.clone()),
            header_safe(&attachment.file_name()),
            mime,
        );
    }
    form
}

fn wire_error(err: io::Error) -> ApiError {
    ApiError::TransportError(ureq::Error::Io(err))
}

/// Stream `params` and `attachments` to `url` through `transport`.
pub fn send_multipart(
    transport: &dyn Transport,
    logger: &dyn Logger,
    url: &str,
    params: &Params,
    attachments: &[Attachment],
) -> Result<HttpResponse, ApiError> {
    check_attachments(attachments)?;

    let failure = ReadFailure::default();
    let form = build_form::<UuidBoundary>(params, attachments, &failure);
    let content_type = form.content_type();
    let body = Body::from(form);
    let (pipe_writer, mut pipe_reader) = pipe(PIPE_CAPACITY);

    let (produced, sent) = thread::scope(|scope| {
        let sender = scope.spawn(move || {
            let result = transport.post(url, &content_type, RequestBody::Stream(&mut pipe_reader));
            if let Err(err) = &result {
                logger.warn(format_args!("multipart request failed: {err}"));
            }
            result
        });

        let produced = produce(body, pipe_writer, &failure);
        let sent = sender
            .join()
            .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
        (produced, sent)
    });

    match (produced, sent) {
        (Err(err @ ApiError::FileError { .. }), _) => Err(err),
        (_, Err(err)) => Err(err),
        (Err(err), Ok(_)) => Err(err),
        (Ok(()), Ok(response)) => Ok(response),
    }
}

/// Drain the encoder into the pipe. The pipe is closed only after the
/// whole body is written; on any failure it is aborted so the sender never
/// submits a truncated body as complete.
fn produce(body: Body<'_>, mut writer: PipeWriter, failure: &ReadFailure) -> Result<(), ApiError> {
    for chunk in block_on_stream(Box::pin(body)) {
        let written = match chunk {
            Ok(bytes) => writer.write_all(&bytes).map_err(wire_error),
            Err(err) => Err(encode_error(failure, err.to_string())),
        };
        if let Err(err) = written {
            writer.abort(io::Error::other(err.to_string()));
            return Err(err);
        }
    }
    writer.close().map_err(wire_error)
}

fn encode_error(failure: &ReadFailure, message: String) -> ApiError {
    failure
        .lock()
        .ok()
        .and_then(|mut slot| slot.take())
        .unwrap_or_else(|| wire_error(io::Error::other(message)))
}
