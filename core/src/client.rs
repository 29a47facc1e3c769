//! Typed bot API calls.
//!
//! # Design
//! Each operation is split like the rest of the crate: a `build_*` method
//! produces a plain `ApiCall` (method name, form fields, attachments) and
//! `Client::call` executes it. Calls with attachments go out as streaming
//! multipart, everything else URL-encoded. The client holds no mutable
//! state; cloning it shares the transport and its connection pool.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::envelope::decode_response;
use crate::error::ApiError;
use crate::http::{ApiCall, Attachment};
use crate::logger::Logger;
use crate::multipart::send_multipart;
use crate::options::{apply_all, SendOption};
use crate::params::Params;
use crate::transport::{send_form, Transport, UreqTransport};
use crate::types::{ChatId, Message, User};

/// Blocking client for the bot API.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Client for the default endpoint.
    pub fn new(token: &str) -> Self {
        Self::from_config(ClientConfig::new(token))
    }

    /// Client for another endpoint, e.g. a self-hosted bot API server. An
    /// empty `base_url` keeps the default.
    pub fn with_base_url(token: &str, base_url: &str) -> Self {
        Self::from_config(ClientConfig::new(token).with_base_url(base_url))
    }

    /// Client with its own `UreqTransport` built from `config`.
    pub fn from_config(config: ClientConfig) -> Self {
        let transport = Arc::new(UreqTransport::new(&config));
        Self::with_transport(config, transport)
    }

    /// Client sharing an existing transport.
    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.config.logger = logger;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -- builders ---------------------------------------------------------

    pub fn build_get_me(&self) -> ApiCall {
        ApiCall::new("getMe", None)
    }

    pub fn build_send_message(
        &self,
        chat_id: impl Into<ChatId>,
        text: &str,
        options: &[SendOption],
    ) -> Result<ApiCall, ApiError> {
        let mut params = chat_params(chat_id.into());
        params.set("text", text);
        apply_all(&mut params, options)?;
        Ok(ApiCall::new("sendMessage", Some(params)))
    }

    pub fn build_forward_message(
        &self,
        chat_id: impl Into<ChatId>,
        from_chat_id: impl Into<ChatId>,
        message_id: i64,
        options: &[SendOption],
    ) -> Result<ApiCall, ApiError> {
        let from_chat_id: ChatId = from_chat_id.into();
        let mut params = chat_params(chat_id.into());
        params.set("from_chat_id", from_chat_id);
        params.set("message_id", message_id);
        apply_all(&mut params, options)?;
        Ok(ApiCall::new("forwardMessage", Some(params)))
    }

    /// Send a sticker already known to the remote service by file id or URL.
    pub fn build_send_sticker(
        &self,
        chat_id: impl Into<ChatId>,
        sticker: &str,
        options: &[SendOption],
    ) -> Result<ApiCall, ApiError> {
        let mut params = chat_params(chat_id.into());
        params.set("sticker", sticker);
        apply_all(&mut params, options)?;
        Ok(ApiCall::new("sendSticker", Some(params)))
    }

    /// Upload a local `.webp` file as a sticker.
    pub fn build_send_sticker_file(
        &self,
        chat_id: impl Into<ChatId>,
        path: impl Into<PathBuf>,
        options: &[SendOption],
    ) -> Result<ApiCall, ApiError> {
        let mut params = chat_params(chat_id.into());
        apply_all(&mut params, options)?;
        Ok(ApiCall::new("sendSticker", Some(params))
            .with_attachment(Attachment::new("sticker", path)))
    }

    // -- execution --------------------------------------------------------

    /// Send `call` and decode its result as `T`.
    pub fn call<T: DeserializeOwned>(&self, call: &ApiCall) -> Result<T, ApiError> {
        let url = self.config.method_url(&call.method);
        self.config
            .logger
            .debug(format_args!("calling {}", call.method));

        let response = if call.is_multipart() {
            let empty = Params::new();
            send_multipart(
                self.transport.as_ref(),
                self.config.logger.as_ref(),
                &url,
                call.params.as_ref().unwrap_or(&empty),
                &call.attachments,
            )?
        } else {
            send_form(self.transport.as_ref(), &url, call.params.as_ref())?
        };
        decode_response(&response)
    }

    /// The bot's own account.
    pub fn get_me(&self) -> Result<User, ApiError> {
        self.call(&self.build_get_me())
    }

    pub fn send_message(
        &self,
        chat_id: impl Into<ChatId>,
        text: &str,
        options: &[SendOption],
    ) -> Result<Message, ApiError> {
        self.call(&self.build_send_message(chat_id, text, options)?)
    }

    pub fn forward_message(
        &self,
        chat_id: impl Into<ChatId>,
        from_chat_id: impl Into<ChatId>,
        message_id: i64,
        options: &[SendOption],
    ) -> Result<Message, ApiError> {
        self.call(&self.build_forward_message(chat_id, from_chat_id, message_id, options)?)
    }

    pub fn send_sticker(
        &self,
        chat_id: impl Into<ChatId>,
        sticker: &str,
        options: &[SendOption],
    ) -> Result<Message, ApiError> {
        self.call(&self.build_send_sticker(chat_id, sticker, options)?)
    }

    pub fn send_sticker_file(
        &self,
        chat_id: impl Into<ChatId>,
        path: impl Into<PathBuf>,
        options: &[SendOption],
    ) -> Result<Message, ApiError> {
        self.call(&self.build_send_sticker_file(chat_id, path, options)?)
    }
}

fn chat_params(chat_id: ChatId) -> Params {
    let mut params = Params::new();
    params.set("chat_id", chat_id);
    params
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpResponse;
    use crate::logger::tests::RecordingLogger;
    use crate::transport::tests::FakeTransport;
    use crate::transport::FORM_CONTENT_TYPE;
    use std::io::Write;

    const MESSAGE: &str = r#"{"message_id":10,"date":1,"chat":{"id":42,"type":"private"},"text":"hi"}"#;

    fn client(transport: &Arc<FakeTransport>) -> Client {
        let transport: Arc<dyn Transport> = transport.clone();
        Client::with_transport(ClientConfig::new("123:abc"), transport)
    }

    #[test]
    fn build_get_me_has_no_body() {
        let call = Client::new("t").build_get_me();
        assert_eq!(call.method, "getMe");
        assert!(call.params.is_none());
        assert!(!call.is_multipart());
    }

    #[test]
    fn build_send_message_applies_options_in_order() {
        let call = Client::new("t")
            .build_send_message(
                "42",
                "hi",
                &[SendOption::parse_mode_html(), SendOption::parse_mode_markdown()],
            )
            .unwrap();
        assert_eq!(call.method, "sendMessage");
        assert_eq!(call.param("chat_id"), Some("42"));
        assert_eq!(call.param("text"), Some("hi"));
        assert_eq!(call.param("parse_mode"), Some("MarkdownV2"));
    }

    #[test]
    fn string_chat_id_is_sent_as_given() {
        let call = Client::new("t").build_send_message("0042", "hi", &[]).unwrap();
        assert_eq!(call.param("chat_id"), Some("0042"));
        assert_eq!(
            call.params.as_ref().unwrap().encode(),
            "chat_id=0042&text=hi"
        );

        let call = Client::new("t")
            .build_forward_message("+7", "007", 1, &[])
            .unwrap();
        assert_eq!(call.param("chat_id"), Some("+7"));
        assert_eq!(call.param("from_chat_id"), Some("007"));
    }

    #[test]
    fn send_message_form_round_trip() {
        let call = Client::new("t")
            .build_send_message("42", "hi", &[SendOption::DisableNotification])
            .unwrap();
        let body = call.params.as_ref().unwrap().encode();
        let decoded = Params::decode(body.as_bytes());
        let expected: Params = [
            ("chat_id", "42"),
            ("text", "hi"),
            ("disable_notification", "true"),
        ]
        .into_iter()
        .collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn build_forward_message_fields() {
        let call = Client::new("t")
            .build_forward_message(-100, "@source", 7, &[SendOption::DisableNotification])
            .unwrap();
        assert_eq!(call.method, "forwardMessage");
        assert_eq!(call.param("chat_id"), Some("-100"));
        assert_eq!(call.param("from_chat_id"), Some("@source"));
        assert_eq!(call.param("message_id"), Some("7"));
        assert!(!call.is_multipart());
    }

    #[test]
    fn build_send_sticker_by_reference_is_urlencoded() {
        let call = Client::new("t").build_send_sticker(1, "CAADAgAD", &[]).unwrap();
        assert_eq!(call.param("sticker"), Some("CAADAgAD"));
        assert!(!call.is_multipart());
    }

    #[test]
    fn build_send_sticker_file_attaches_file() {
        let call = Client::new("t")
            .build_send_sticker_file(1, "a.webp", &[SendOption::reply_to(3)])
            .unwrap();
        assert_eq!(call.method, "sendSticker");
        assert!(call.is_multipart());
        assert_eq!(call.attachments, vec![Attachment::new("sticker", "a.webp")]);
        assert_eq!(call.param("sticker"), None);
        assert_eq!(call.param("reply_to_message_id"), Some("3"));
    }

    #[test]
    fn get_me_posts_to_method_url() {
        let transport = Arc::new(FakeTransport::ok(r#"{"id":1,"is_bot":true,"first_name":"Bot"}"#));
        let me = client(&transport).get_me().unwrap();
        assert_eq!(me.id, 1);

        let requests = transport.requests();
        assert_eq!(requests[0].url, "https://api.telegram.org/bot123:abc/getMe");
        assert_eq!(requests[0].content_type, FORM_CONTENT_TYPE);
        assert_eq!(requests[0].body, None);
    }

    #[test]
    fn send_message_returns_message() {
        let transport = Arc::new(FakeTransport::ok(MESSAGE));
        let message = client(&transport)
            .send_message(42, "hi", &[SendOption::DisableWebPagePreview])
            .unwrap();
        assert_eq!(message.message_id, 10);

        let body = transport.requests()[0].body.clone().unwrap();
        let sent = Params::decode(&body);
        assert_eq!(sent.get("disable_web_page_preview"), Some("true"));
    }

    #[test]
    fn remote_failure_surfaces_description() {
        let transport = Arc::new(FakeTransport::replying(vec![Ok(HttpResponse::new(
            200,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        ))]));
        let err = client(&transport).send_message(1, "x", &[]).unwrap_err();
        assert_eq!(err.to_string(), "Bad Request: chat not found");
        assert_eq!(err.error_code(), Some(400));
    }

    #[test]
    fn send_sticker_file_streams_multipart() {
        let mut file = tempfile::Builder::new().suffix(".webp").tempfile().unwrap();
        file.write_all(b"webp-bytes").unwrap();

        let transport = Arc::new(FakeTransport::ok(MESSAGE));
        let logger = Arc::new(RecordingLogger::default());
        client(&transport)
            .with_logger(logger.clone())
            .send_sticker_file(42, file.path(), &[])
            .unwrap();

        let requests = transport.requests();
        assert!(requests[0].content_type.starts_with("multipart/form-data; boundary="));
        let body = String::from_utf8(requests[0].body.clone().unwrap()).unwrap();
        assert!(body.contains("name=\"chat_id\""));
        assert!(body.contains("\r\n\r\n42\r\n"));
        assert!(body.contains("name=\"sticker\"; filename="));
        assert!(body.contains("webp-bytes"));
        assert_eq!(logger.lines(), ["debug: calling sendSticker"]);
    }

    #[test]
    fn missing_sticker_file_makes_no_request() {
        let transport = Arc::new(FakeTransport::default());
        let err = client(&transport)
            .send_sticker_file("42", "no/such/dir/a.webp", &[])
            .unwrap_err();
        assert!(matches!(err, ApiError::FileError { .. }));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn debug_does_not_leak_token() {
        let rendered = format!("{:?}", Client::new("123:secret"));
        assert!(!rendered.contains("secret"));
    }
}
