mod common;

use rowdb::{Database, EngineConfig, Error, ExecOutcome, IndexBackend, OperationKind, QueryResult};

const SETUP: &[&str] = &[
    "CREATE TABLE student (id, name, gpa, age)",
    "INSERT INTO student VALUES (1, 'John Doe', 3.5, 20)",
    "INSERT INTO student VALUES (2, 'Jane Smith', 3.9, 19)",
    "INSERT INTO student VALUES (3, 'Mark Davis', 3.2, 21)",
    "INSERT INTO student VALUES (4, 'Emma Wilson', 3.8, 22)",
];

fn session(config: EngineConfig) -> Database {
    common::init_tracing_for_tests();
    let mut db = Database::with_config(config);
    for sql in SETUP {
        db.execute(sql).unwrap();
    }
    db
}

fn ids(result: &QueryResult) -> Vec<&str> {
    result.rows.iter().map(|row| row.primary_key()).collect()
}

fn configs() -> Vec<EngineConfig> {
    [IndexBackend::BTree, IndexBackend::Avl]
        .into_iter()
        .map(|index_backend| EngineConfig {
            index_backend,
            ..EngineConfig::default()
        })
        .collect()
}

#[test]
fn select_queries() {
    for config in configs() {
        let db = session(config);

        let cases = [
            ("SELECT * FROM student", vec!["1", "2", "3", "4"]),
            ("SELECT * FROM student WHERE id = 3", vec!["3"]),
            ("SELECT * FROM student WHERE gpa >= 3.8", vec!["2", "4"]),
            ("SELECT * FROM student WHERE age < 21", vec!["1", "2"]),
            ("SELECT * FROM student WHERE age > 9", vec!["1", "2", "3", "4"]),
            ("SELECT * FROM student WHERE name < 'Jane Smith'", vec!["4"]),
            ("SELECT * FROM student WHERE name <> 'Jane Smith'", vec!["1", "3", "4"]),
            ("SELECT * FROM student WHERE gpa > 3.0 AND age < 20 OR gpa = 3.2", vec!["2", "3"]),
            ("SELECT * FROM student WHERE age < 20 OR gpa = 3.2 AND age > 20", vec!["3"]),
            ("SELECT * FROM student WHERE gpa = 3.50", vec![]),
        ];
        for (sql, expected) in cases {
            let result = db.query(sql).unwrap();
            assert_eq!(ids(&result), expected, "{sql}");
        }
    }
}

#[test]
fn update_delete_and_undo_round_trip() {
    for config in configs() {
        let mut db = session(config);
        let initial = db.query("SELECT * FROM student").unwrap();

        let outcome = db
            .execute("UPDATE student SET age = 30 WHERE gpa > 3.6")
            .unwrap();
        assert_eq!(
            outcome,
            ExecOutcome::Updated {
                table: "student".into(),
                rows: 2
            }
        );
        assert_eq!(
            ids(&db.query("SELECT * FROM student WHERE age = 30").unwrap()),
            vec!["2", "4"]
        );

        db.execute("DELETE FROM student WHERE age >= 30").unwrap();
        db.execute("UPDATE student SET id = 10 WHERE id = 1").unwrap();
        assert_eq!(
            ids(&db.query("SELECT * FROM student").unwrap()),
            vec!["10", "3"]
        );

        for expected in [OperationKind::Update, OperationKind::Delete, OperationKind::Update] {
            match db.execute("UNDO").unwrap() {
                ExecOutcome::Undone(outcome) => assert_eq!(outcome.kind, expected),
                other => panic!("unexpected outcome {other:?}"),
            }
        }

        assert_eq!(db.query("SELECT * FROM student").unwrap(), initial);
        assert!(db.table("student").unwrap().is_consistent());
    }
}

#[test]
fn failed_commands_change_nothing() {
    let mut db = session(EngineConfig::default());
    let depth = db.undo_depth();

    for (sql, expected) in [
        ("INSERT INTO student VALUES (1, 'Dup', 1.0, 1)", Error::DuplicatePrimaryKey("1".into())),
        ("INSERT INTO student VALUES (5, 'Short')", Error::ArityMismatch { expected: 4, found: 2 }),
        ("UPDATE student SET major = 'cs'", Error::ColumnNotFound("major".into())),
        ("UPDATE student SET id = 2 WHERE id = 1", Error::DuplicatePrimaryKey("2".into())),
        ("UPDATE student SET id = 9 WHERE age > 20", Error::DuplicatePrimaryKey("9".into())),
        ("DELETE FROM student WHERE major = 'cs'", Error::ColumnNotFound("major".into())),
        ("DELETE FROM teacher", Error::TableNotFound("teacher".into())),
        ("CREATE TABLE student (id)", Error::DuplicateTable("student".into())),
        ("CREATE TABLE t (a, b, a)", Error::DuplicateColumn("a".into())),
    ] {
        assert_eq!(db.execute(sql), Err(expected), "{sql}");
    }

    assert_eq!(db.undo_depth(), depth);
    assert_eq!(db.table("student").unwrap().len(), 4);
    assert!(db.table("student").unwrap().is_consistent());
}

#[test]
fn config_from_json() {
    let config: EngineConfig = serde_json::from_str(r#"{ "index_backend": "avl", "undo_depth": 1 }"#).unwrap();
    let mut db = session(config);

    assert_eq!(
        db.table("student")
            .unwrap()
            .index("gpa")
            .unwrap()
            .backend(),
        IndexBackend::Avl
    );

    db.execute("DELETE FROM student").unwrap();
    db.execute("UNDO").unwrap();
    assert_eq!(db.table("student").unwrap().len(), 4);
    assert_eq!(db.execute("UNDO"), Err(Error::NothingToUndo));
}

#[test]
fn drop_table_forgets_history() {
    let mut db = session(EngineConfig::default());
    db.execute("CREATE TABLE course (code, title)").unwrap();
    db.execute("INSERT INTO course VALUES (cs201, 'Data Structures')")
        .unwrap();

    db.execute("DROP TABLE course").unwrap();

    // only the student inserts are left
    assert_eq!(db.undo_depth(), 4);
    assert_eq!(
        db.query("SELECT * FROM course"),
        Err(Error::TableNotFound("course".into()))
    );
    match db.execute("UNDO").unwrap() {
        ExecOutcome::Undone(outcome) => assert_eq!(outcome.table, "student"),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn history_replays_and_clears() {
    let mut db = session(EngineConfig::default());
    assert_eq!(db.history().len(), SETUP.len());

    db.execute("DELETE FROM student WHERE gpa < 3.6").unwrap();
    db.execute("UNDO").unwrap();
    assert_eq!(db.table("student").unwrap().len(), 4);

    // 6: DELETE, 7: UNDO
    match db.execute("EXECUTE 6").unwrap() {
        ExecOutcome::Deleted { table, rows } => assert_eq!((table.as_str(), rows), ("student", 2)),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(
        ids(&db.query("SELECT * FROM student").unwrap()),
        vec!["2", "4"]
    );

    let listing = db.execute("HISTORY").unwrap().to_string();
    assert_eq!(listing.lines().count(), 8);
    assert_eq!(listing.lines().last(), Some("8: DELETE FROM student WHERE gpa < 3.6"));

    db.execute("CLEAR HISTORY").unwrap();
    assert_eq!(db.execute("EXECUTE 1"), Err(Error::HistoryEntryNotFound(1)));
    assert_eq!(db.execute("HISTORY").unwrap().to_string(), "");
}

#[test]
fn history_keeps_the_last_25_commands() {
    let mut db = session(EngineConfig::default());
    for id in 10..40 {
        db.execute(&format!("INSERT INTO student VALUES ({id}, x, 1.0, 18)"))
            .unwrap();
    }

    let history = db.history();
    assert_eq!(history.len(), EngineConfig::DEFAULT_HISTORY_DEPTH);
    assert_eq!(history.get(1), Some("INSERT INTO student VALUES (15, x, 1.0, 18)"));
    assert_eq!(history.get(25), Some("INSERT INTO student VALUES (39, x, 1.0, 18)"));
}
