use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use super::models::{ChatMessage, Lesson, NewSubmission, PracticeProblem, TestCase};
use super::schema::{split_sql_statements, SQLITE_SCHEMA_SQL};
use super::{PerformanceStore, StoreError};

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and ensures the schema.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Config(e.to_string()))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        info!(url, "sqlite store ready");
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        for stmt in split_sql_statements(SQLITE_SCHEMA_SQL) {
            sqlx::query(&stmt).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn set_skill_level(&self, user_id: &str, level: u32) -> Result<(), StoreError> {
        let now = now_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO "profiles" ("user_id", "skill_level", "created_at", "updated_at")
            VALUES (?, ?, ?, ?)
            ON CONFLICT ("user_id") DO UPDATE SET
                "skill_level" = excluded."skill_level",
                "updated_at" = excluded."updated_at"
            "#,
        )
        .bind(user_id)
        .bind(i64::from(level))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO "lessons"
                ("id", "title", "description", "content", "code_example", "difficulty", "order_number")
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&lesson.id)
        .bind(&lesson.title)
        .bind(&lesson.description)
        .bind(&lesson.content)
        .bind(&lesson.code_example)
        .bind(&lesson.difficulty)
        .bind(lesson.order_number)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn upsert_problem(&self, problem: &PracticeProblem) -> Result<(), StoreError> {
        let test_cases = serde_json::to_string(&problem.test_cases)?;
        let topics = serde_json::to_string(&problem.topics)?;
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO "practice_problems"
                ("id", "title", "description", "difficulty", "order_number",
                 "starter_code", "function_name", "test_cases", "topics")
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&problem.id)
        .bind(&problem.title)
        .bind(&problem.description)
        .bind(&problem.difficulty)
        .bind(problem.order_number)
        .bind(&problem.starter_code)
        .bind(&problem.function_name)
        .bind(test_cases)
        .bind(topics)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn map_lesson(row: &SqliteRow) -> Result<Lesson, StoreError> {
    Ok(Lesson {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        content: row.try_get("content")?,
        code_example: row.try_get("code_example")?,
        difficulty: row.try_get("difficulty")?,
        order_number: row.try_get("order_number")?,
    })
}

fn map_problem(row: &SqliteRow) -> Result<PracticeProblem, StoreError> {
    let test_cases: String = row.try_get("test_cases")?;
    let topics: String = row.try_get("topics")?;
    Ok(PracticeProblem {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        difficulty: row.try_get("difficulty")?,
        order_number: row.try_get("order_number")?,
        starter_code: row.try_get("starter_code")?,
        function_name: row.try_get("function_name")?,
        test_cases: serde_json::from_str::<Vec<TestCase>>(&test_cases)?,
        topics: serde_json::from_str(&topics)?,
    })
}

#[async_trait]
impl PerformanceStore for SqliteStore {
    async fn baseline_skill_level(&self, user_id: &str) -> Result<Option<u32>, StoreError> {
        let level: Option<i64> =
            sqlx::query_scalar(r#"SELECT "skill_level" FROM "profiles" WHERE "user_id" = ?"#)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(level.map(|v| u32::try_from(v.max(0)).unwrap_or(u32::MAX)))
    }

    async fn completed_lesson_count(&self, user_id: &str) -> Result<u32, StoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM "lesson_progress" WHERE "user_id" = ? AND "completed" = 1"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(u32::try_from(count.max(0)).unwrap_or(u32::MAX))
    }

    async fn recent_outcomes(&self, user_id: &str, limit: usize) -> Result<Vec<bool>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let outcomes: Vec<bool> = sqlx::query_scalar(
            r#"
            SELECT "passed" FROM "practice_submissions"
            WHERE "user_id" = ?
            ORDER BY "submitted_at" DESC, "seq" DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(outcomes)
    }

    async fn record_submission(&self, submission: &NewSubmission) -> Result<(), StoreError> {
        let result = submission
            .result
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        sqlx::query(
            r#"
            INSERT INTO "practice_submissions"
                ("id", "user_id", "problem_id", "code", "passed", "result", "submitted_at")
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&submission.user_id)
        .bind(&submission.problem_id)
        .bind(&submission.code)
        .bind(submission.passed)
        .bind(result)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await?;
        debug!(user_id = %submission.user_id, problem_id = %submission.problem_id, passed = submission.passed, "submission recorded");
        Ok(())
    }

    async fn mark_lesson_complete(&self, user_id: &str, lesson_id: &str) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO "lesson_progress" ("user_id", "lesson_id", "completed", "completed_at")
            VALUES (?, ?, 1, ?)
            ON CONFLICT ("user_id", "lesson_id") DO UPDATE SET
                "completed" = 1,
                "completed_at" = COALESCE("lesson_progress"."completed_at", excluded."completed_at")
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(now_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn lessons(&self) -> Result<Vec<Lesson>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT "id", "title", "description", "content", "code_example", "difficulty", "order_number"
            FROM "lessons" ORDER BY "order_number" ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_lesson).collect()
    }

    async fn problems(&self) -> Result<Vec<PracticeProblem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT "id", "title", "description", "difficulty", "order_number",
                   "starter_code", "function_name", "test_cases", "topics"
            FROM "practice_problems" ORDER BY "order_number" ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(map_problem).collect()
    }

    async fn save_conversation(&self, user_id: &str, messages: &[ChatMessage]) -> Result<(), StoreError> {
        let body = serde_json::to_string(messages)?;
        let now = now_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO "chatbot_conversations" ("user_id", "messages", "created_at", "updated_at")
            VALUES (?, ?, ?, ?)
            ON CONFLICT ("user_id") DO UPDATE SET
                "messages" = excluded."messages",
                "updated_at" = excluded."updated_at"
            "#,
        )
        .bind(user_id)
        .bind(body)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn conversation(&self, user_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let body: Option<String> = sqlx::query_scalar(
            r#"SELECT "messages" FROM "chatbot_conversations" WHERE "user_id" = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match body {
            Some(body) => Ok(serde_json::from_str(&body)?),
            None => Ok(Vec::new()),
        }
    }
}
