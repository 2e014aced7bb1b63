/// Table names follow the hosted learner database.
pub const SQLITE_SCHEMA_SQL: &str = r#"
-- learner profile, skill_level is the stored baseline
CREATE TABLE IF NOT EXISTS "profiles" (
    "user_id" TEXT PRIMARY KEY,
    "display_name" TEXT,
    "skill_level" INTEGER NOT NULL DEFAULT 1,
    "created_at" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    "updated_at" TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS "lessons" (
    "id" TEXT PRIMARY KEY,
    "title" TEXT NOT NULL,
    "description" TEXT,
    "content" TEXT NOT NULL,
    "code_example" TEXT,
    "difficulty" TEXT,
    "order_number" INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS "lesson_progress" (
    "user_id" TEXT NOT NULL,
    "lesson_id" TEXT NOT NULL,
    "completed" INTEGER NOT NULL DEFAULT 0,
    "completed_at" TEXT,
    PRIMARY KEY ("user_id", "lesson_id")
);

-- test_cases and topics hold JSON arrays
CREATE TABLE IF NOT EXISTS "practice_problems" (
    "id" TEXT PRIMARY KEY,
    "title" TEXT NOT NULL,
    "description" TEXT NOT NULL,
    "difficulty" TEXT,
    "order_number" INTEGER NOT NULL,
    "starter_code" TEXT,
    "function_name" TEXT NOT NULL,
    "test_cases" TEXT NOT NULL DEFAULT '[]',
    "topics" TEXT NOT NULL DEFAULT '[]'
);

CREATE TABLE IF NOT EXISTS "practice_submissions" (
    "seq" INTEGER PRIMARY KEY AUTOINCREMENT,
    "id" TEXT NOT NULL UNIQUE,
    "user_id" TEXT NOT NULL,
    "problem_id" TEXT NOT NULL,
    "code" TEXT NOT NULL,
    "passed" INTEGER NOT NULL DEFAULT 0,
    "result" TEXT,
    "submitted_at" TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS "idx_submissions_user_time"
    ON "practice_submissions" ("user_id", "submitted_at");

CREATE TABLE IF NOT EXISTS "chatbot_conversations" (
    "user_id" TEXT PRIMARY KEY,
    "messages" TEXT NOT NULL DEFAULT '[]',
    "created_at" TEXT NOT NULL,
    "updated_at" TEXT NOT NULL
);
"#;

/// Splits a script on `;` outside quotes. Comment lines are dropped from
/// each statement; empty statements are skipped.
pub fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_single_quote = false;
    let mut in_double_quote = false;

    let mut flush = |current: &mut String| {
        let trimmed = current.trim();
        if !trimmed.is_empty() {
            statements.push(trimmed.to_string());
        }
        current.clear();
    };

    for line in sql.lines() {
        // Comment lines are dropped before quote tracking sees them.
        if !in_single_quote && !in_double_quote && line.trim_start().starts_with("--") {
            continue;
        }
        for ch in line.chars() {
            match ch {
                '\'' if !in_double_quote => in_single_quote = !in_single_quote,
                '"' if !in_single_quote => in_double_quote = !in_double_quote,
                ';' if !in_single_quote && !in_double_quote => {
                    flush(&mut current);
                    continue;
                }
                _ => {}
            }
            current.push(ch);
        }
        current.push('\n');
    }
    flush(&mut current);

    statements
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ignores_semicolons_in_quotes() {
        let sql = r#"INSERT INTO "t" ("v") VALUES ('a;b'); SELECT ";";"#;
        let statements = split_sql_statements(sql);
        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0], r#"INSERT INTO "t" ("v") VALUES ('a;b')"#);
        assert_eq!(statements[1], r#"SELECT ";""#);
    }

    #[test]
    fn test_split_drops_comment_lines() {
        let sql = "-- header\nCREATE TABLE a (x INTEGER);\n-- only a comment;\n";
        let statements = split_sql_statements(sql);
        assert_eq!(statements, vec!["CREATE TABLE a (x INTEGER)".to_string()]);
    }

    #[test]
    fn test_split_ignores_apostrophes_in_comments() {
        let sql = "-- the learner's profile\nCREATE TABLE a (x INTEGER);\n-- don't split here\nCREATE TABLE b (y INTEGER);\n";
        let statements = split_sql_statements(sql);
        assert_eq!(
            statements,
            vec!["CREATE TABLE a (x INTEGER)".to_string(), "CREATE TABLE b (y INTEGER)".to_string()]
        );
    }

    #[test]
    fn test_schema_statement_count() {
        assert_eq!(split_sql_statements(SQLITE_SCHEMA_SQL).len(), 7);
    }
}
