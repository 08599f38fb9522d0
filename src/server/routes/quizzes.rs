use std::collections::HashSet;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::questions::{get_all_questions, get_questions_for_category},
        Question,
    },
    server::{
        app::AppState,
        quiz::{pick_unseen, ALL_CATEGORIES},
    },
    telemetry::QUIZ_CNTR,
};

use super::{ApiError, ApiResponse};

#[derive(Deserialize)]
struct QuizCategory {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    id: i64,
}

/// Both fields are required. `previous_questions` must hold integer ids,
/// `["20"]` is a bad request like a missing field.
#[derive(Deserialize)]
struct QuizRequest {
    quiz_category: QuizCategory,
    previous_questions: Vec<i64>,
}

#[derive(Serialize)]
struct QuizBody {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<Question>,
}

async fn next_question(
    State(pool): State<SqlitePool>,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResponse<Json<QuizBody>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!("Rejected quiz request: {rejection}");
        ApiError::BadRequest
    })?;
    let category = request.quiz_category.id;

    let candidates = if category == ALL_CATEGORIES {
        get_all_questions(&pool).await?
    } else {
        get_questions_for_category(&pool, category).await?
    };
    let seen: HashSet<i64> = request.previous_questions.into_iter().collect();
    let question = pick_unseen(&candidates, &seen, &mut rand::thread_rng()).cloned();

    match &question {
        Some(q) => {
            QUIZ_CNTR
                .with_label_values(&[category.to_string().as_str()])
                .inc();
            tracing::debug!(category, id = q.id, "Serving quiz question");
        }
        None => tracing::debug!(category, seen = seen.len(), "Quiz pool exhausted"),
    }
    Ok(Json(QuizBody {
        success: true,
        question,
    }))
}

pub fn quizzes_router(state: AppState) -> Router {
    Router::new()
        .route("/quizzes", post(next_question))
        .with_state(state)
}
