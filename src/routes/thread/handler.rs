use axum::extract::{Json, Path, State};

use crate::{AppState, common::DataList, error::AppError};

use super::model::{Message, Run, Thread};

#[axum::debug_handler]
pub async fn create_thread(
    State(state): State<AppState>,
    Json(thread): Json<Thread>,
) -> Json<Thread> {
    tracing::info!("Creating thread: {}", thread.id);
    Json(state.registry.insert_thread(thread))
}

#[axum::debug_handler]
pub async fn get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<Thread>, AppError> {
    tracing::info!("Getting thread: {}", thread_id);
    state
        .registry
        .thread(&thread_id)
        .map(Json)
        .ok_or(AppError::NotFound("Thread"))
}

#[axum::debug_handler]
pub async fn create_message(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
    Json(message): Json<Message>,
) -> Result<Json<Message>, AppError> {
    tracing::info!("Creating message in thread: {}", thread_id);
    state
        .registry
        .append_message(&thread_id, message)
        .map(Json)
        .ok_or(AppError::NotFound("Thread"))
}

#[axum::debug_handler]
pub async fn list_messages(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<DataList<Message>>, AppError> {
    tracing::info!("Listing messages for thread: {}", thread_id);
    state
        .registry
        .messages(&thread_id)
        .map(|messages| Json(messages.into()))
        .ok_or(AppError::NotFound("Thread"))
}

/// 用线程历史调用模型，回复追加到线程；模型失败时记录为 failed 运行
#[axum::debug_handler]
pub async fn create_run(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<Json<Run>, AppError> {
    tracing::info!("Creating run for thread: {}", thread_id);
    let thread = state
        .registry
        .thread(&thread_id)
        .ok_or(AppError::NotFound("Thread"))?;

    let history: Vec<_> = thread.messages.iter().map(Message::to_chat).collect();
    let run = match state.responder.respond(&history).await {
        Ok(reply) => {
            state
                .registry
                .append_message(&thread_id, Message::from_reply(&thread_id, reply));
            Run::completed(&thread)
        }
        Err(e) => {
            tracing::error!("Run failed for thread {}: {}", thread_id, e);
            Run::failed(&thread, e.to_string())
        }
    };

    Ok(Json(state.registry.insert_run(run)))
}

#[axum::debug_handler]
pub async fn get_run(
    State(state): State<AppState>,
    Path((thread_id, run_id)): Path<(String, String)>,
) -> Result<Json<Run>, AppError> {
    tracing::info!("Getting run {} for thread: {}", run_id, thread_id);
    if state.registry.thread(&thread_id).is_none() {
        return Err(AppError::NotFound("Thread"));
    }
    state
        .registry
        .run(&thread_id, &run_id)
        .map(Json)
        .ok_or(AppError::NotFound("Run"))
}
