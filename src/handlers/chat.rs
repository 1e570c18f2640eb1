use crate::errors::ServiceError;
use crate::llm::ChatTurn;
use crate::services::chat::Language;
use crate::{ApiResponse, ApiResult, AppState};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    response::Json,
};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "messages": [{ "role": "user", "content": "how many packets today?" }]
}))]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,
    /// Answer language; detected from the question when omitted
    pub language: Option<Language>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({ "question": "how many packets between 2025-03-10 and 2025-03-15?" }))]
pub struct ChatQueryRequest {
    #[validate(length(min = 1))]
    pub question: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatQueryResponse {
    pub answer: String,
}

/// Streams the assistant's reply as server-sent events. Each event carries a
/// content delta; the stream ends with a `[DONE]` marker. Dropping the
/// connection cancels the upstream completion.
#[utoipa::path(
    post,
    path = "/api/v1/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "SSE stream of reply chunks"),
        (status = 400, description = "No user message in the conversation", body = crate::errors::ErrorResponse),
        (status = 502, description = "Assistant unavailable", body = crate::errors::ErrorResponse)
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ServiceError> {
    if payload.messages.is_empty() {
        return Err(ServiceError::InvalidInput(
            "messages must not be empty".to_string(),
        ));
    }

    let opened = state
        .chat
        .stream_reply(&payload.messages, payload.language)
        .await?;
    let language = opened.language;

    let events = opened
        .stream
        .filter_map(move |chunk| async move {
            match chunk {
                Ok(response) => {
                    let content = response
                        .choices
                        .first()
                        .and_then(|c| c.delta.content.clone())?;
                    let body = json!({
                        "content": content,
                        "role": "assistant",
                        "language": language.code(),
                    });
                    Some(Ok(Event::default().data(body.to_string())))
                }
                Err(e) => Some(Ok(Event::default()
                    .data(json!({ "error": e.to_string() }).to_string()))),
            }
        })
        .chain(futures::stream::once(async {
            Ok(Event::default().data("[DONE]"))
        }));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

#[utoipa::path(
    post,
    path = "/api/v1/chat/query",
    request_body = ChatQueryRequest,
    responses(
        (status = 200, description = "Count answered straight from the database", body = ApiResponse<ChatQueryResponse>),
        (status = 400, description = "Empty question", body = crate::errors::ErrorResponse)
    ),
    tag = "chat"
)]
pub async fn chat_query(
    State(state): State<AppState>,
    Json(payload): Json<ChatQueryRequest>,
) -> ApiResult<ChatQueryResponse> {
    payload.validate().map_err(ServiceError::from)?;
    let answer = state.chat.answer_query(&payload.question).await?;
    Ok(Json(ApiResponse::success(ChatQueryResponse { answer })))
}
