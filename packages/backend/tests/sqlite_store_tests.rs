use serde_json::json;
use tempfile::TempDir;

use pylearn_backend::services::SnapshotAssembler;
use pylearn_backend::store::{
    ChatMessage, Lesson, NewSubmission, PerformanceStore, PracticeProblem, SqliteStore, TestCase,
};

async fn open_store(dir: &TempDir) -> SqliteStore {
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("pylearn.db").display());
    SqliteStore::connect(&url).await.expect("failed to open store")
}

fn submission(user_id: &str, problem_id: &str, passed: bool) -> NewSubmission {
    NewSubmission {
        user_id: user_id.to_string(),
        problem_id: problem_id.to_string(),
        code: "def f():\n    return 1\n".to_string(),
        passed,
        result: Some(json!({ "passed": passed })),
    }
}

#[tokio::test]
async fn test_sqlite_database_creation() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let store = open_store(&temp_dir).await;

    assert!(temp_dir.path().join("pylearn.db").exists());

    let tables: Vec<String> = sqlx::query_scalar(
        r#"SELECT "name" FROM "sqlite_master" WHERE "type" = 'table' AND "name" NOT LIKE 'sqlite_%' ORDER BY "name""#,
    )
    .fetch_all(store.pool())
    .await
    .expect("failed to list tables");

    assert_eq!(
        tables,
        vec![
            "chatbot_conversations",
            "lesson_progress",
            "lessons",
            "practice_problems",
            "practice_submissions",
            "profiles",
        ]
    );
}

#[tokio::test]
async fn test_reopen_keeps_data() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    {
        let store = open_store(&temp_dir).await;
        store.set_skill_level("u1", 4).await.unwrap();
        store.mark_lesson_complete("u1", "intro").await.unwrap();
        store.pool().close().await;
    }

    let store = open_store(&temp_dir).await;
    assert_eq!(store.baseline_skill_level("u1").await.unwrap(), Some(4));
    assert_eq!(store.completed_lesson_count("u1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_unknown_learner_has_no_history() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let store = open_store(&temp_dir).await;

    assert_eq!(store.baseline_skill_level("ghost").await.unwrap(), None);
    assert_eq!(store.completed_lesson_count("ghost").await.unwrap(), 0);
    assert!(store.recent_outcomes("ghost", 10).await.unwrap().is_empty());
    assert!(store.conversation("ghost").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_recent_outcomes_most_recent_first() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let store = open_store(&temp_dir).await;

    for passed in [true, true, false, true, false] {
        store.record_submission(&submission("u1", "p1", passed)).await.unwrap();
    }
    store.record_submission(&submission("u2", "p1", true)).await.unwrap();

    assert_eq!(store.recent_outcomes("u1", 3).await.unwrap(), vec![false, true, false]);
    assert_eq!(store.recent_outcomes("u1", 50).await.unwrap().len(), 5);
    assert_eq!(store.recent_outcomes("u2", 10).await.unwrap(), vec![true]);
}

#[tokio::test]
async fn test_lesson_completion_is_idempotent() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let store = open_store(&temp_dir).await;

    store.mark_lesson_complete("u1", "intro").await.unwrap();
    store.mark_lesson_complete("u1", "intro").await.unwrap();
    store.mark_lesson_complete("u1", "loops").await.unwrap();

    assert_eq!(store.completed_lesson_count("u1").await.unwrap(), 2);
}

#[tokio::test]
async fn test_catalog_round_trips_json_columns() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let store = open_store(&temp_dir).await;

    let problem = PracticeProblem {
        id: "sum".to_string(),
        title: "Sum a list".to_string(),
        description: "Return the sum of xs".to_string(),
        difficulty: Some("intermediate".to_string()),
        order_number: 2,
        starter_code: None,
        function_name: "total".to_string(),
        test_cases: vec![
            TestCase { input: vec![json!([1, 2, 3])], expected: json!(6) },
            TestCase { input: vec![json!([])], expected: json!(0) },
        ],
        topics: vec!["lists".to_string(), "loops".to_string()],
    };
    store.upsert_problem(&problem).await.unwrap();

    for (id, order) in [("b", 2), ("a", 1)] {
        store
            .upsert_lesson(&Lesson {
                id: id.to_string(),
                title: id.to_uppercase(),
                description: None,
                content: format!("lesson {id}"),
                code_example: Some("print('hi')".to_string()),
                difficulty: None,
                order_number: order,
            })
            .await
            .unwrap();
    }

    assert_eq!(store.problems().await.unwrap(), vec![problem]);
    let ids: Vec<String> = store.lessons().await.unwrap().into_iter().map(|l| l.id).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_conversation_upsert() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let store = open_store(&temp_dir).await;

    let first = vec![ChatMessage::assistant("Hi!"), ChatMessage::user("what is a list?")];
    store.save_conversation("u1", &first).await.unwrap();

    let mut second = first.clone();
    second.push(ChatMessage::assistant("A list is an ordered collection."));
    store.save_conversation("u1", &second).await.unwrap();

    assert_eq!(store.conversation("u1").await.unwrap(), second);
}

#[tokio::test]
async fn test_snapshot_from_sqlite_history() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let store = open_store(&temp_dir).await;

    for lesson in 0..20 {
        store.mark_lesson_complete("u1", &format!("lesson-{lesson}")).await.unwrap();
    }
    for _ in 0..10 {
        store.record_submission(&submission("u1", "p1", true)).await.unwrap();
    }

    let standing = SnapshotAssembler::default().standing(&store, "u1").await;
    assert_eq!(standing.snapshot.skill_level_hint, 1);
    assert_eq!(standing.skill_score(), 100.0);
}
