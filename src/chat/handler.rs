use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::ai::prompt::{build_user_prompt, SYSTEM_PROMPT};
use crate::ai::LlmProvider;
use crate::chat::sessions::{ChatTurn, SessionStore};
use crate::dashboard::ChartSpec;
use crate::retriever::retrieve_context;
use crate::stats::StatsIndex;

#[derive(Clone)]
pub struct ChatState {
    pub llm: LlmProvider,
    pub index: Arc<StatsIndex>,
    pub sessions: SessionStore,
    pub charts: Arc<Vec<ChartSpec>>,
    pub transaction_count: usize,
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
pub struct SseChunk {
    pub text: String,
}

#[derive(Serialize)]
pub struct SseDone {
    pub conversation_id: String,
}

#[derive(Serialize)]
pub struct SseError {
    pub message: String,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    pub conversation_id: String,
}

#[derive(Deserialize)]
pub struct HistoryRequest {
    pub conversation_id: String,
}

#[derive(Serialize)]
pub struct QuickStats {
    pub total_revenue: f64,
    pub average_transaction: f64,
    pub best_selling_product: String,
    pub transaction_count: usize,
}

pub async fn chat(
    State(state): State<ChatState>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl futures_util::stream::Stream<Item = Result<Event, std::fmt::Error>>>, StatusCode> {
    let msg = req.message.clone();
    let conv_id = req.conversation_id.clone();
    let llm = state.llm.clone();
    let index = state.index.clone();
    let sessions = state.sessions.clone();

    let stream = async_stream::stream! {
        let conversation_id = sessions.get_or_create(conv_id.as_deref()).await;
        info!(conversation_id = %conversation_id, message = %msg, "chat request");

        let context = retrieve_context(&msg, &index);
        let user_prompt = build_user_prompt(&context, &msg);

        match llm.complete(SYSTEM_PROMPT, &user_prompt).await {
            Ok(answer) => {
                info!(conversation_id = %conversation_id, answer_len = answer.len(), "chat complete");
                sessions.append(&conversation_id, &msg, &answer).await;

                for chunk in answer.split_whitespace() {
                    let sse = Event::default()
                        .event("chunk")
                        .json_data(SseChunk {
                            text: format!("{} ", chunk),
                        });
                    if let Ok(evt) = sse {
                        yield Ok(evt);
                    }
                }

                let done_event = Event::default()
                    .event("done")
                    .json_data(SseDone {
                        conversation_id: conversation_id.clone(),
                    });
                if let Ok(evt) = done_event {
                    yield Ok(evt);
                }
            }
            Err(err) => {
                let message = err.to_string();
                error!(conversation_id = %conversation_id, error = %message, "generator error");
                let err_event = Event::default()
                    .event("error")
                    .json_data(SseError { message });
                if let Ok(evt) = err_event {
                    yield Ok(evt);
                }
            }
        }
    };

    Ok(Sse::new(stream))
}

pub async fn reset(
    State(state): State<ChatState>,
    Json(req): Json<ResetRequest>,
) -> StatusCode {
    state.sessions.delete(&req.conversation_id).await;
    StatusCode::OK
}

pub async fn history(
    State(state): State<ChatState>,
    Json(req): Json<HistoryRequest>,
) -> Json<Vec<ChatTurn>> {
    Json(state.sessions.history(&req.conversation_id).await)
}

pub async fn quick_stats(State(state): State<ChatState>) -> Json<QuickStats> {
    Json(QuickStats {
        total_revenue: state.index.total_revenue,
        average_transaction: state.index.average_transaction,
        best_selling_product: state.index.best_selling_product.clone(),
        transaction_count: state.transaction_count,
    })
}

pub async fn dashboard(State(state): State<ChatState>) -> Json<Vec<ChartSpec>> {
    Json(state.charts.as_ref().clone())
}

pub fn router(state: ChatState) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/chat/reset", post(reset))
        .route("/api/chat/history", post(history))
        .route("/api/stats", get(quick_stats))
        .route("/api/dashboard", get(dashboard))
        .with_state(state)
}
