use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: i64,
    pub difficulty: i64,
}

pub async fn get_all_questions(pool: &SqlitePool) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_question_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Question> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
}

pub async fn get_questions_for_category(
    pool: &SqlitePool,
    category: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        WHERE questions.category = ?1
        ORDER BY id
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await
}

/// Questions whose text contains `term`, ignoring case. The term is matched
/// literally, `%` and `_` carry no special meaning.
pub async fn search_questions(pool: &SqlitePool, term: &str) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        WHERE instr(lower(questions.question), lower(?1)) > 0
        ORDER BY id
        "#,
    )
    .bind(term)
    .fetch_all(pool)
    .await
}

pub async fn count_questions(pool: &SqlitePool) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM questions
        "#,
    )
    .fetch_one(pool)
    .await
}

pub async fn create_question(pool: &SqlitePool, question: &NewQuestion) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.category)
    .bind(question.difficulty)
    .execute(pool)
    .await?
    .last_insert_rowid();

    Ok(id)
}

pub async fn update_question(pool: &SqlitePool, question: &Question) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE questions SET question = ?1, answer = ?2, category = ?3, difficulty = ?4
        WHERE questions.id = ?5
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(question.category)
    .bind(question.difficulty)
    .bind(question.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete_question(pool: &SqlitePool, id: i64) -> sqlx::Result<()> {
    let deleted = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();
    if deleted == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

// Imported rows keep their ids so exports can be restored as-is.
pub async fn import_questions(pool: &SqlitePool, questions: Vec<Question>) -> sqlx::Result<()> {
    let existing: HashSet<i64> = get_all_questions(pool)
        .await?
        .iter()
        .map(|q| q.id)
        .collect();
    for question in questions {
        if existing.contains(&question.id) {
            update_question(pool, &question).await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO questions (id, question, answer, category, difficulty)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(question.id)
            .bind(&question.question)
            .bind(&question.answer)
            .bind(question.category)
            .bind(question.difficulty)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::categories::create_category;
    use crate::db::{establish_memory_connection, run_migrations};

    async fn seeded_pool() -> SqlitePool {
        let pool = establish_memory_connection().await.unwrap();
        run_migrations(&pool).await.unwrap();
        create_category(&pool, 1, "Science").await.unwrap();
        create_category(&pool, 2, "Art").await.unwrap();
        pool
    }

    fn new_question(text: &str, category: i64) -> NewQuestion {
        NewQuestion {
            question: text.to_owned(),
            answer: "answer".to_owned(),
            category,
            difficulty: 1,
        }
    }

    #[tokio::test]
    async fn search_is_case_insensitive_substring() {
        let pool = seeded_pool().await;
        create_question(&pool, &new_question("Which TITLE fits?", 1))
            .await
            .unwrap();
        create_question(&pool, &new_question("No match here", 2))
            .await
            .unwrap();

        let found = search_questions(&pool, "title").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].question, "Which TITLE fits?");

        assert!(search_questions(&pool, "%").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn ids_are_not_reused_after_delete() {
        let pool = seeded_pool().await;
        let first = create_question(&pool, &new_question("one", 1)).await.unwrap();
        let second = create_question(&pool, &new_question("two", 1)).await.unwrap();
        delete_question(&pool, second).await.unwrap();

        let third = create_question(&pool, &new_question("three", 1))
            .await
            .unwrap();
        assert!(third > second && second > first);
        assert_eq!(count_questions(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_of_missing_question_is_row_not_found() {
        let pool = seeded_pool().await;
        let err = delete_question(&pool, 500).await.unwrap_err();
        assert!(matches!(err, sqlx::Error::RowNotFound));
    }

    #[tokio::test]
    async fn unknown_category_is_rejected() {
        let pool = seeded_pool().await;
        assert!(create_question(&pool, &new_question("orphan", 99))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn category_filter_keeps_order() {
        let pool = seeded_pool().await;
        let a = create_question(&pool, &new_question("a", 2)).await.unwrap();
        create_question(&pool, &new_question("b", 1)).await.unwrap();
        let c = create_question(&pool, &new_question("c", 2)).await.unwrap();

        let ids: Vec<i64> = get_questions_for_category(&pool, 2)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec![a, c]);
    }
}
