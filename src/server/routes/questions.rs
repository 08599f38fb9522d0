use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{
            categories::get_category_labels,
            questions::{self, count_questions, get_all_questions, search_questions},
        },
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        pagination::{paginate, PageQuery},
    },
    telemetry::QUESTION_CHANGES_CNTR,
};

use super::{ApiError, ApiResponse};

// Raw body of `POST /questions`; it is validated into `QuestionsRequest`
// before the handler sees it. Create fields are only checked when no search
// term is given.
#[derive(Deserialize)]
struct QuestionsBody {
    #[serde(default, rename = "searchTerm")]
    search_term: Option<Value>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    category: Option<Value>,
    #[serde(default)]
    difficulty: Option<Value>,
}

/// The two payloads accepted by `POST /questions`. A non-empty search term
/// wins over the create fields.
#[derive(Debug, PartialEq, Deserialize)]
#[serde(try_from = "QuestionsBody")]
enum QuestionsRequest {
    Search(String),
    Create(NewQuestion),
}

// Scalars are searched for by their text form, `{"searchTerm": 5}` looks for "5".
fn search_text(value: Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(format!("searchTerm must be a scalar, got {other}")),
    }
}

fn integer_field(name: &str, value: Option<Value>) -> Result<i64, String> {
    match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("{name} must be an integer"))
}

impl TryFrom<QuestionsBody> for QuestionsRequest {
    type Error = String;

    fn try_from(body: QuestionsBody) -> Result<Self, Self::Error> {
        let term = body.search_term.map(search_text).transpose()?.flatten();
        if let Some(term) = term.filter(|t| !t.is_empty()) {
            return Ok(QuestionsRequest::Search(term));
        }
        match (body.question, body.answer) {
            (Some(question), Some(answer)) => Ok(QuestionsRequest::Create(NewQuestion {
                question,
                answer,
                category: integer_field("category", body.category)?,
                difficulty: integer_field("difficulty", body.difficulty)?,
            })),
            _ => Err("question, answer, category and difficulty are required".to_owned()),
        }
    }
}

#[derive(Serialize)]
struct QuestionsPage {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    categories: BTreeMap<i64, String>,
}

#[derive(Serialize)]
struct DeletedBody {
    success: bool,
    deleted: i64,
    questions: Vec<Question>,
    total_questions: i64,
}

#[derive(Serialize)]
struct SearchBody {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
}

#[derive(Serialize)]
struct CreatedBody {
    success: bool,
    created: i64,
    questions: Vec<Question>,
    total_questions: i64,
}

fn page_of(query: Result<Query<PageQuery>, QueryRejection>) -> i64 {
    query.map(|Query(q)| q).unwrap_or_default().page
}

async fn questions_page(
    State(pool): State<SqlitePool>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResponse<Json<QuestionsPage>> {
    let page = page_of(query);
    let selection = get_all_questions(&pool).await?;
    let questions = paginate(&selection, page);
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(QuestionsPage {
        success: true,
        questions,
        total_questions: selection.len(),
        categories: get_category_labels(&pool).await?,
    }))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResponse<Json<DeletedBody>> {
    let Path(id) = id.map_err(|_| ApiError::NotFound)?;
    let page = page_of(query);

    questions::delete_question(&pool, id)
        .await
        .map_err(|e| ApiError::unprocessable(format!("deleting question {id}: {e}")))?;
    QUESTION_CHANGES_CNTR.with_label_values(&["deleted"]).inc();
    tracing::info!(id, "Question deleted");

    let remaining = get_all_questions(&pool)
        .await
        .map_err(ApiError::unprocessable)?;
    Ok(Json(DeletedBody {
        success: true,
        deleted: id,
        questions: paginate(&remaining, page),
        total_questions: count_questions(&pool)
            .await
            .map_err(ApiError::unprocessable)?,
    }))
}

async fn create_or_search(
    State(pool): State<SqlitePool>,
    query: Result<Query<PageQuery>, QueryRejection>,
    payload: Result<Json<QuestionsRequest>, JsonRejection>,
) -> ApiResponse<Response> {
    let page = page_of(query);
    let Json(request) = payload.map_err(ApiError::unprocessable)?;

    match request {
        QuestionsRequest::Search(term) => {
            let selection = search_questions(&pool, &term)
                .await
                .map_err(ApiError::unprocessable)?;
            tracing::debug!(term = %term, matches = selection.len(), "Searched questions");
            Ok(Json(SearchBody {
                success: true,
                questions: paginate(&selection, page),
                total_questions: selection.len(),
            })
            .into_response())
        }
        QuestionsRequest::Create(new_question) => {
            let id = questions::create_question(&pool, &new_question)
                .await
                .map_err(ApiError::unprocessable)?;
            QUESTION_CHANGES_CNTR.with_label_values(&["created"]).inc();
            tracing::info!(id, category = new_question.category, "Question created");

            let selection = get_all_questions(&pool)
                .await
                .map_err(ApiError::unprocessable)?;
            Ok(Json(CreatedBody {
                success: true,
                created: id,
                questions: paginate(&selection, page),
                total_questions: count_questions(&pool)
                    .await
                    .map_err(ApiError::unprocessable)?,
            })
            .into_response())
        }
    }
}

pub fn questions_router(state: AppState) -> Router {
    Router::new()
        .route("/questions", get(questions_page).post(create_or_search))
        .route("/questions/{id}", delete(delete_question))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: serde_json::Value) -> Result<QuestionsRequest, serde_json::Error> {
        serde_json::from_value(body)
    }

    #[test]
    fn search_term_selects_search() {
        assert_eq!(
            parse(json!({"searchTerm": "title"})).unwrap(),
            QuestionsRequest::Search("title".to_owned())
        );
    }

    #[test]
    fn search_term_wins_over_create_fields() {
        let request = parse(json!({
            "searchTerm": "cat",
            "question": "How many lives does a cat have?",
            "answer": "Nine",
            "category": 1,
            "difficulty": 1
        }))
        .unwrap();
        assert_eq!(request, QuestionsRequest::Search("cat".to_owned()));
    }

    #[test]
    fn complete_body_selects_create() {
        let request = parse(json!({
            "question": "How many lives does a cat have?",
            "answer": "Nine",
            "category": "1",
            "difficulty": 2
        }))
        .unwrap();
        assert_eq!(
            request,
            QuestionsRequest::Create(NewQuestion {
                question: "How many lives does a cat have?".to_owned(),
                answer: "Nine".to_owned(),
                category: 1,
                difficulty: 2,
            })
        );
    }

    #[test]
    fn malformed_create_fields_do_not_block_search() {
        let request = parse(json!({"searchTerm": "title", "category": "science"})).unwrap();
        assert_eq!(request, QuestionsRequest::Search("title".to_owned()));

        let request = parse(json!({"searchTerm": "title", "difficulty": [1, 2]})).unwrap();
        assert_eq!(request, QuestionsRequest::Search("title".to_owned()));
    }

    #[test]
    fn scalar_search_terms_are_searched_as_text() {
        assert_eq!(
            parse(json!({"searchTerm": 5})).unwrap(),
            QuestionsRequest::Search("5".to_owned())
        );
        assert!(parse(json!({"searchTerm": ["title"]})).is_err());
    }

    #[test]
    fn empty_search_term_falls_back_to_create() {
        let request = parse(json!({
            "searchTerm": "",
            "question": "q",
            "answer": "a",
            "category": 3,
            "difficulty": 1
        }))
        .unwrap();
        assert!(matches!(request, QuestionsRequest::Create(_)));
    }

    #[test]
    fn incomplete_bodies_are_rejected() {
        assert!(parse(json!({})).is_err());
        assert!(parse(json!({"searchTerm": ""})).is_err());
        assert!(parse(json!({"question": "q", "answer": "a", "category": 1})).is_err());
        assert!(parse(json!({
            "question": "q",
            "answer": "a",
            "category": null,
            "difficulty": 1
        }))
        .is_err());
        assert!(parse(json!({
            "question": "q",
            "answer": "a",
            "category": "science",
            "difficulty": 1
        }))
        .is_err());
    }
}
