//! Blocking client for the Telegram Bot API.
//!
//! # Overview
//! Typed calls (`getMe`, `sendMessage`, `forwardMessage`, `sendSticker`)
//! over plain HTTP POST. Form fields are sent URL-encoded, or as a streamed
//! `multipart/form-data` body when files are attached, and every response is
//! unwrapped from the service's `{ok, result, description, ...}` envelope
//! into either the typed result or an `ApiError`.
//!
//! # Design
//! - `Client` builds plain `ApiCall` values (`build_*`) and executes them
//!   (`call`), so request construction is testable without a network.
//! - The network sits behind the `Transport` trait. `UreqTransport` owns one
//!   pooled agent that clients share.
//! - Optional features are `SendOption`s applied to a `Params` map in the
//!   order given; later options win on the same key.
//! - No retries, polling or rate limiting. Retry hints from the service are
//!   exposed on `ApiError` for the caller to act on.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod http;
pub mod logger;
pub mod multipart;
pub mod options;
pub mod params;
pub mod pipe;
pub mod transport;
pub mod types;

pub use client::Client;
pub use config::ClientConfig;
pub use envelope::{decode_response, Envelope, ResponseParameters};
pub use error::ApiError;
pub use http::{ApiCall, Attachment, HttpResponse, RequestBody};
pub use logger::{BasicLogger, Logger, NopLogger};
pub use options::{ParseMode, ReplyMarkup, SendOption};
pub use params::Params;
pub use transport::{Transport, UreqTransport};
pub use types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, Message,
    ReplyKeyboardMarkup, User,
};
