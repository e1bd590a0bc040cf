use rusqlite::Connection;
use serde_json::json;
use sqlquest_core::{
    decode_level_questions, get_failed_questions, get_stats, init_schema, save_attempt,
    save_questions, GameConfig, Level, LevelSession, Phase,
};

fn level_two_payload() -> String {
    let text = r#"```json
{"tasks": [
  {"id": 1, "task": "Employees per department with more than five people", "answer": "SELECT dept, COUNT(*) FROM emp GROUP BY dept HAVING COUNT(*) > 5"},
  {"id": 2, "task": "Unique cities", "answer": "SELECT DISTINCT city FROM customers"}
]}
```"#;
    json!([{ "content": { "parts": [{ "text": text }] } }]).to_string()
}

#[test]
fn play_level_and_record_attempts() {
    let conn = Connection::open_in_memory().unwrap();
    init_schema(&conn).unwrap();

    let questions = decode_level_questions(&level_two_payload(), Level::Two).unwrap();
    assert_eq!(questions.len(), 2);
    save_questions(&conn, &questions).unwrap();

    let mut session = LevelSession::new(Level::Two, questions, GameConfig::default()).unwrap();

    let outcome = session
        .submit("select dept, count(*) from emp group by dept having count(*) > 3")
        .unwrap();
    assert_eq!(outcome.phase, Phase::LockedCorrect);
    save_attempt(&conn, &outcome.attempt).unwrap();
    session.advance().unwrap();

    for answer in ["select city from customers", "select name from customers"] {
        let outcome = session.submit(answer).unwrap();
        assert!(!outcome.check.is_correct);
        save_attempt(&conn, &outcome.attempt).unwrap();
    }
    assert_eq!(session.phase(), Phase::LockedOutOfHearts);
    assert_eq!(session.advance().unwrap(), Phase::Advancing);
    assert_eq!(session.level().next(), Some(Level::Three));

    let stats = get_stats(&conn, Some(Level::Two)).unwrap();
    assert_eq!(stats.total_attempts, 3);
    assert_eq!(stats.correct_count, 1);

    let failed = get_failed_questions(&conn, None).unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].0.task, "Unique cities");
    assert_eq!(failed[0].1, 2);
}
