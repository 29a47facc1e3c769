//! HTTP execution.
//!
//! # Design
//! `Transport` is the only seam that touches the network. `UreqTransport`
//! wraps one `ureq::Agent`; clones share its connection pool, so a single
//! transport built at startup can serve every client and thread. Tests swap
//! in a fake that records what it was given.
//!
//! Non-2xx answers are returned as data with an empty body: the envelope
//! codec reports them from the status line alone.

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpResponse, RequestBody};
use crate::params::Params;

pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
pub const ACCEPT: &str = "application/json";

/// Sends one POST and returns the response, or the network failure.
pub trait Transport: Send + Sync {
    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: RequestBody<'_>,
    ) -> Result<HttpResponse, ApiError>;
}

/// Blocking transport over a pooled `ureq::Agent`.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .timeout_connect(Some(config.connect_timeout))
            .max_idle_connections(config.max_idle_connections)
            .max_idle_age(config.idle_timeout)
            .build()
            .new_agent();
        Self { agent }
    }

    pub fn from_agent(agent: ureq::Agent) -> Self {
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn post(
        &self,
        url: &str,
        content_type: &str,
        body: RequestBody<'_>,
    ) -> Result<HttpResponse, ApiError> {
        let request = self
            .agent
            .post(url)
            .content_type(content_type)
            .header("Accept", ACCEPT);

        let mut response = match body {
            RequestBody::Empty => request.send_empty(),
            RequestBody::Bytes(bytes) => request.send(bytes),
            RequestBody::Stream(reader) => request.send(ureq::SendBody::from_reader(reader)),
        }?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        if !status.is_success() {
            return Ok(HttpResponse {
                status: status.as_u16(),
                reason,
                body: Vec::new(),
            });
        }
        let body = response.body_mut().read_to_vec()?;
        Ok(HttpResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

/// POST `params` URL-encoded, or with no body when `params` is `None`.
pub fn send_form(
    transport: &dyn Transport,
    url: &str,
    params: Option<&Params>,
) -> Result<HttpResponse, ApiError> {
    match params {
        Some(params) => {
            let body = params.encode();
            transport.post(url, FORM_CONTENT_TYPE, RequestBody::Bytes(body.as_bytes()))
        }
        None => transport.post(url, FORM_CONTENT_TYPE, RequestBody::Empty),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Read;
    use std::sync::Mutex;

    /// One request as a `Transport` saw it.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) struct Recorded {
        pub(crate) url: String,
        pub(crate) content_type: String,
        pub(crate) body: Option<Vec<u8>>,
    }

    /// Records requests and replays queued responses in order.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        pub(crate) requests: Mutex<Vec<Recorded>>,
        pub(crate) responses: Mutex<VecDeque<Result<HttpResponse, ApiError>>>,
    }

    impl FakeTransport {
        pub(crate) fn replying(responses: Vec<Result<HttpResponse, ApiError>>) -> Self {
            Self {
                requests: Mutex::default(),
                responses: Mutex::new(responses.into()),
            }
        }

        pub(crate) fn ok(result: &str) -> Self {
            Self::replying(vec![Ok(HttpResponse::new(
                200,
                format!(r#"{{"ok":true,"result":{result}}}"#),
            ))])
        }

        pub(crate) fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        fn post(
            &self,
            url: &str,
            content_type: &str,
            body: RequestBody<'_>,
        ) -> Result<HttpResponse, ApiError> {
            let body = match body {
                RequestBody::Empty => None,
                RequestBody::Bytes(bytes) => Some(bytes.to_vec()),
                RequestBody::Stream(reader) => {
                    let mut bytes = Vec::new();
                    reader
                        .read_to_end(&mut bytes)
                        .map_err(|err| ApiError::TransportError(ureq::Error::Io(err)))?;
                    Some(bytes)
                }
            };
            self.requests.lock().unwrap().push(Recorded {
                url: url.to_string(),
                content_type: content_type.to_string(),
                body,
            });
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(HttpResponse::new(200, r#"{"ok":true,"result":true}"#)))
        }
    }

    #[test]
    fn send_form_encodes_params() {
        let transport = FakeTransport::default();
        let params: Params = [("chat_id", "42"), ("text", "hi")].into_iter().collect();
        send_form(&transport, "http://bot/sendMessage", Some(&params)).unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].content_type, FORM_CONTENT_TYPE);
        assert_eq!(requests[0].body.as_deref(), Some(&b"chat_id=42&text=hi"[..]));
    }

    #[test]
    fn send_form_without_params_sends_no_body() {
        let transport = FakeTransport::default();
        send_form(&transport, "http://bot/getMe", None).unwrap();
        assert_eq!(transport.requests()[0].body, None);
    }

    #[test]
    fn transport_failure_is_returned_unchanged() {
        let transport = FakeTransport::replying(vec![Err(ApiError::TransportError(
            ureq::Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            )),
        ))]);
        let err = send_form(&transport, "http://bot/getMe", None).unwrap_err();
        assert!(matches!(err, ApiError::TransportError(ureq::Error::Io(_))));
    }

    #[test]
    fn ureq_transport_reports_connection_failure() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = UreqTransport::new(&ClientConfig::new("t"));
        let err = send_form(&transport, &format!("http://{addr}/bott/getMe"), None).unwrap_err();
        assert!(matches!(err, ApiError::TransportError(_)));
    }
}
