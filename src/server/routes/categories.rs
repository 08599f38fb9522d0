use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    routing::get,
    Json, Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_category_labels, questions::get_questions_for_category},
        Question,
    },
    server::{
        app::AppState,
        pagination::{paginate, PageQuery},
    },
};

use super::{ApiError, ApiResponse};

#[derive(Serialize)]
struct CategoriesBody {
    success: bool,
    categories: BTreeMap<i64, String>,
}

#[derive(Serialize)]
struct CategoryQuestionsBody {
    success: bool,
    questions: Vec<Question>,
    total_questions: usize,
    current_category: i64,
    categories: BTreeMap<i64, String>,
}

async fn get_categories(State(pool): State<SqlitePool>) -> ApiResponse<Json<CategoriesBody>> {
    let categories = get_category_labels(&pool).await?;
    if categories.is_empty() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(CategoriesBody {
        success: true,
        categories,
    }))
}

async fn questions_for_category(
    State(pool): State<SqlitePool>,
    id: Result<Path<i64>, PathRejection>,
    page: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResponse<Json<CategoryQuestionsBody>> {
    let Path(id) = id.map_err(|_| ApiError::NotFound)?;
    let PageQuery { page } = page.map(|Query(q)| q).unwrap_or_default();

    let selection = get_questions_for_category(&pool, id).await?;
    let questions = paginate(&selection, page);
    if questions.is_empty() {
        return Err(ApiError::NotFound);
    }
    tracing::debug!(category = id, page, "Listing questions for category");
    Ok(Json(CategoryQuestionsBody {
        success: true,
        questions,
        total_questions: selection.len(),
        current_category: id,
        categories: get_category_labels(&pool).await?,
    }))
}

pub fn category_router(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/{id}/questions", get(questions_for_category))
        .with_state(state)
}
