//! Optional modifiers attached to a call.
//!
//! # Design
//! A `SendOption` mutates a `Params` in place. The catalogue of known
//! options is a closed enum; `SendOption::custom` accepts any closure for
//! fields the catalogue does not cover. Options are applied in the order the
//! caller lists them, so when two touch the same key the later one wins.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::ApiError;
use crate::params::Params;
use crate::types::{InlineKeyboardMarkup, ReplyKeyboardMarkup};

/// Text formatting mode for `parse_mode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Html,
    MarkdownV2,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Html => "HTML",
            ParseMode::MarkdownV2 => "MarkdownV2",
        }
    }
}

/// The `reply_markup` payload. Each variant serializes to its own JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    InlineKeyboard(InlineKeyboardMarkup),
    ReplyKeyboard(ReplyKeyboardMarkup),
    RemoveKeyboard(ReplyKeyboardRemove),
    ForceReply(ForceReply),
}

impl ReplyMarkup {
    pub fn remove_keyboard(selective: bool) -> Self {
        ReplyMarkup::RemoveKeyboard(ReplyKeyboardRemove {
            remove_keyboard: true,
            selective,
        })
    }

    pub fn force_reply(selective: bool) -> Self {
        ReplyMarkup::ForceReply(ForceReply {
            force_reply: true,
            selective,
        })
    }

    pub fn to_json(&self) -> Result<String, ApiError> {
        serde_json::to_string(self).map_err(ApiError::SerializationError)
    }
}

/// Hides the current custom keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardRemove {
    pub remove_keyboard: bool,
    pub selective: bool,
}

/// Shows a reply interface to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForceReply {
    pub force_reply: bool,
    pub selective: bool,
}

type CustomFn = dyn Fn(&mut Params) + Send + Sync;

/// One optional feature of a call.
#[derive(Clone)]
pub enum SendOption {
    ParseMode(ParseMode),
    DisableNotification,
    ReplyToMessageId(i64),
    AllowSendingWithoutReply,
    DisableWebPagePreview,
    ReplyMarkup(ReplyMarkup),
    Custom(Arc<CustomFn>),
}

impl SendOption {
    pub fn parse_mode_html() -> Self {
        SendOption::ParseMode(ParseMode::Html)
    }

    pub fn parse_mode_markdown() -> Self {
        SendOption::ParseMode(ParseMode::MarkdownV2)
    }

    pub fn reply_to(message_id: i64) -> Self {
        SendOption::ReplyToMessageId(message_id)
    }

    pub fn inline_keyboard(markup: InlineKeyboardMarkup) -> Self {
        SendOption::ReplyMarkup(ReplyMarkup::InlineKeyboard(markup))
    }

    pub fn reply_keyboard(markup: ReplyKeyboardMarkup) -> Self {
        SendOption::ReplyMarkup(ReplyMarkup::ReplyKeyboard(markup))
    }

    pub fn remove_keyboard() -> Self {
        SendOption::ReplyMarkup(ReplyMarkup::remove_keyboard(false))
    }

    pub fn remove_keyboard_selective() -> Self {
        SendOption::ReplyMarkup(ReplyMarkup::remove_keyboard(true))
    }

    pub fn force_reply() -> Self {
        SendOption::ReplyMarkup(ReplyMarkup::force_reply(false))
    }

    pub fn force_reply_selective() -> Self {
        SendOption::ReplyMarkup(ReplyMarkup::force_reply(true))
    }

    /// Wrap an arbitrary mutation of the call's parameters.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&mut Params) + Send + Sync + 'static,
    {
        SendOption::Custom(Arc::new(f))
    }

    /// Apply this option to `params`.
    pub fn apply(&self, params: &mut Params) -> Result<(), ApiError> {
        match self {
            SendOption::ParseMode(mode) => params.set("parse_mode", mode.as_str()),
            SendOption::DisableNotification => params.set("disable_notification", "true"),
            SendOption::ReplyToMessageId(id) => params.set("reply_to_message_id", id),
            SendOption::AllowSendingWithoutReply => {
                params.set("allow_sending_without_reply", "true")
            }
            SendOption::DisableWebPagePreview => params.set("disable_web_page_preview", "true"),
            SendOption::ReplyMarkup(markup) => params.set("reply_markup", markup.to_json()?),
            SendOption::Custom(f) => (f.as_ref())(params),
        }
        Ok(())
    }
}

impl fmt::Debug for SendOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendOption::ParseMode(mode) => f.debug_tuple("ParseMode").field(mode).finish(),
            SendOption::DisableNotification => f.write_str("DisableNotification"),
            SendOption::ReplyToMessageId(id) => f.debug_tuple("ReplyToMessageId").field(id).finish(),
            SendOption::AllowSendingWithoutReply => f.write_str("AllowSendingWithoutReply"),
            SendOption::DisableWebPagePreview => f.write_str("DisableWebPagePreview"),
            SendOption::ReplyMarkup(markup) => f.debug_tuple("ReplyMarkup").field(markup).finish(),
            SendOption::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<ParseMode> for SendOption {
    fn from(mode: ParseMode) -> Self {
        SendOption::ParseMode(mode)
    }
}

impl From<ReplyMarkup> for SendOption {
    fn from(markup: ReplyMarkup) -> Self {
        SendOption::ReplyMarkup(markup)
    }
}

/// Apply `options` to `params` in order.
pub fn apply_all(params: &mut Params, options: &[SendOption]) -> Result<(), ApiError> {
    options.iter().try_for_each(|option| option.apply(params))
}
