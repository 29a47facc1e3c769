use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Token accepted by `app()`.
pub const TOKEN: &str = "123456:TEST-TOKEN";

/// `chat_id` that makes `sendMessage` answer with a flood-wait failure.
pub const FLOOD_CHAT: &str = "@flood";
/// `chat_id` that makes `sendMessage` answer with a migration failure.
pub const MIGRATED_CHAT: &str = "-42";
pub const MIGRATED_TO: i64 = -1001234567890;

/// A file part received in a multipart request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// One request as the server received it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: String,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    pub fields: HashMap<String, String>,
    pub files: Vec<UploadedFile>,
}

#[derive(Debug)]
pub struct MockState {
    token: String,
    calls: RwLock<Vec<RecordedCall>>,
    next_message_id: AtomicI64,
}

impl MockState {
    pub fn new(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: token.to_string(),
            calls: RwLock::new(Vec::new()),
            next_message_id: AtomicI64::new(1),
        })
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// For callers outside the runtime, such as blocking test threads.
    pub fn calls_blocking(&self) -> Vec<RecordedCall> {
        self.calls.blocking_read().clone()
    }
}

pub type Db = Arc<MockState>;

pub fn app() -> Router {
    app_with_state(MockState::new(TOKEN))
}

pub fn app_with_state(db: Db) -> Router {
    Router::new()
        .route("/{bot}/{method}", post(dispatch))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(db)).await
}

fn ok(result: Value) -> Response {
    Json(json!({ "ok": true, "result": result })).into_response()
}

fn failure(error_code: i64, description: &str, parameters: Option<Value>) -> Response {
    let mut body = json!({ "ok": false, "error_code": error_code, "description": description });
    if let Some(parameters) = parameters {
        body["parameters"] = parameters;
    }
    Json(body).into_response()
}

fn header_value(request: &Request, name: header::HeaderName) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn dispatch(
    State(db): State<Db>,
    Path((bot, method)): Path<(String, String)>,
    request: Request,
) -> Response {
    if bot.strip_prefix("bot") != Some(db.token.as_str()) {
        let body = json!({ "ok": false, "error_code": 401, "description": "Unauthorized" });
        return (StatusCode::UNAUTHORIZED, Json(body)).into_response();
    }

    let content_type = header_value(&request, header::CONTENT_TYPE);
    let accept = header_value(&request, header::ACCEPT);
    let is_multipart = content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let mut fields = HashMap::new();
    let mut files = Vec::new();
    if is_multipart {
        let mut multipart = match Multipart::from_request(request, &db).await {
            Ok(multipart) => multipart,
            Err(rejection) => return rejection.into_response(),
        };
        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => break,
                Err(rejection) => return rejection.into_response(),
            };
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let part_type = field.content_type().map(str::to_string);
            let bytes = match field.bytes().await {
                Ok(bytes) => bytes,
                Err(rejection) => return rejection.into_response(),
            };
            if file_name.is_some() {
                files.push(UploadedFile {
                    field: name,
                    file_name,
                    content_type: part_type,
                    bytes: bytes.to_vec(),
                });
            } else {
                fields.insert(name, String::from_utf8_lossy(&bytes).into_owned());
            }
        }
    } else if content_type.is_some() {
        match Form::<HashMap<String, String>>::from_request(request, &db).await {
            Ok(Form(form)) => fields = form,
            Err(rejection) => return rejection.into_response(),
        }
    }

    let call = RecordedCall {
        method: method.clone(),
        content_type,
        accept,
        fields,
        files,
    };
    db.calls.write().await.push(call.clone());

    match method.as_str() {
        "getMe" => ok(json!({
            "id": 123456,
            "is_bot": true,
            "first_name": "Mock Bot",
            "username": "mock_bot",
            "can_join_groups": true
        })),
        "sendMessage" => send_message(&db, &call),
        "forwardMessage" => forward_message(&db, &call),
        "sendSticker" => send_sticker(&db, &call),
        "internalError" => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
        }
        "garbage" => (StatusCode::OK, "this is not json").into_response(),
        _ => (
            StatusCode::NOT_FOUND,
            Json(json!({ "ok": false, "error_code": 404, "description": "Not Found" })),
        )
            .into_response(),
    }
}

fn chat(chat_id: &str) -> Value {
    match chat_id.parse::<i64>() {
        Ok(id) => {
            let kind = if id < 0 { "supergroup" } else { "private" };
            json!({ "id": id, "type": kind })
        }
        Err(_) => json!({
            "id": -100500,
            "type": "channel",
            "username": chat_id.trim_start_matches('@')
        }),
    }
}

fn message(db: &MockState, chat_id: &str) -> Value {
    let date = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    json!({
        "message_id": db.next_message_id.fetch_add(1, Ordering::SeqCst),
        "from": { "id": 123456, "is_bot": true, "first_name": "Mock Bot" },
        "date": date,
        "chat": chat(chat_id),
    })
}

fn send_message(db: &MockState, call: &RecordedCall) -> Response {
    let Some(chat_id) = call.fields.get("chat_id") else {
        return failure(400, "Bad Request: chat_id is empty", None);
    };
    match chat_id.as_str() {
        FLOOD_CHAT => {
            return failure(
                429,
                "Too Many Requests: retry after 5",
                Some(json!({ "retry_after": 5 })),
            )
        }
        MIGRATED_CHAT => {
            return failure(
                400,
                "Bad Request: group chat was upgraded to a supergroup chat",
                Some(json!({ "migrate_to_chat_id": MIGRATED_TO })),
            )
        }
        _ => {}
    }
    let Some(text) = call.fields.get("text").filter(|t| !t.is_empty()) else {
        return failure(400, "Bad Request: message text is empty", None);
    };

    let mut result = message(db, chat_id);
    result["text"] = json!(text);
    if let Some(markup) = call.fields.get("reply_markup") {
        match serde_json::from_str::<Value>(markup) {
            Ok(markup) if markup.get("inline_keyboard").is_some() => {
                result["reply_markup"] = markup;
            }
            Ok(_) => {}
            Err(_) => {
                return failure(
                    400,
                    "Bad Request: can't parse reply keyboard markup JSON object",
                    None,
                )
            }
        }
    }
    ok(result)
}

fn forward_message(db: &MockState, call: &RecordedCall) -> Response {
    let (Some(chat_id), Some(from_chat_id), Some(message_id)) = (
        call.fields.get("chat_id"),
        call.fields.get("from_chat_id"),
        call.fields.get("message_id"),
    ) else {
        return failure(400, "Bad Request: message to forward not found", None);
    };
    let Ok(message_id) = message_id.parse::<i64>() else {
        return failure(400, "Bad Request: message_id is invalid", None);
    };
    let mut result = message(db, chat_id);
    result["forward_from_chat"] = chat(from_chat_id);
    result["forward_from_message_id"] = json!(message_id);
    result["forward_date"] = result["date"].clone();
    ok(result)
}

fn send_sticker(db: &MockState, call: &RecordedCall) -> Response {
    let Some(chat_id) = call.fields.get("chat_id") else {
        return failure(400, "Bad Request: chat_id is empty", None);
    };
    let sticker = if let Some(file) = call.files.iter().find(|f| f.field == "sticker") {
        json!({
            "file_id": format!("uploaded-{}", Uuid::new_v4().simple()),
            "file_unique_id": Uuid::new_v4().simple().to_string(),
            "width": 512,
            "height": 512,
            "file_size": file.bytes.len(),
        })
    } else if let Some(file_id) = call.fields.get("sticker") {
        json!({
            "file_id": file_id,
            "file_unique_id": format!("unique-{file_id}"),
            "width": 512,
            "height": 512,
            "emoji": "👍",
        })
    } else {
        return failure(400, "Bad Request: there is no sticker in the request", None);
    };
    let mut result = message(db, chat_id);
    result["sticker"] = sticker;
    ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_for_numeric_id() {
        assert_eq!(chat("42"), json!({ "id": 42, "type": "private" }));
        assert_eq!(chat("-7"), json!({ "id": -7, "type": "supergroup" }));
    }

    #[test]
    fn chat_for_username() {
        let chat = chat("@news");
        assert_eq!(chat["type"], "channel");
        assert_eq!(chat["username"], "news");
    }

    #[test]
    fn message_ids_increase() {
        let db = MockState::new(TOKEN);
        let first = message(&db, "1");
        let second = message(&db, "1");
        assert_eq!(first["message_id"], 1);
        assert_eq!(second["message_id"], 2);
    }

    #[test]
    fn recorded_call_roundtrips_through_json() {
        let call = RecordedCall {
            method: "sendMessage".to_string(),
            content_type: Some("application/x-www-form-urlencoded".to_string()),
            accept: Some("application/json".to_string()),
            fields: HashMap::from([("chat_id".to_string(), "1".to_string())]),
            files: Vec::new(),
        };
        let json = serde_json::to_string(&call).unwrap();
        let back: RecordedCall = serde_json::from_str(&json).unwrap();
        assert_eq!(back, call);
    }

    #[test]
    fn flood_chat_fails_inside_ok_status() {
        let db = MockState::new(TOKEN);
        let call = RecordedCall {
            method: "sendMessage".to_string(),
            content_type: None,
            accept: None,
            fields: HashMap::from([("chat_id".to_string(), FLOOD_CHAT.to_string())]),
            files: Vec::new(),
        };
        let response = send_message(&db, &call);
        assert_eq!(response.status(), StatusCode::OK);
    }
}
