use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;
use vraxion::observe::{Sink, TracingSink};
use vraxion::persist::Persistor;
use vraxion::{Database, Instance, OrmError, ScalarType, Schema, Settings};

#[derive(Default)]
struct Recorder {
    info: Mutex<Vec<String>>,
    error: Mutex<Vec<String>>,
}

impl Sink for Recorder {
    fn info(&self, message: &str) {
        self.info.lock().unwrap().push(message.to_string());
    }
    fn error(&self, message: &str) {
        self.error.lock().unwrap().push(message.to_string());
    }
}

fn author() -> Arc<Schema> {
    Schema::builder("Author")
        .column("name", ScalarType::Text)
        .build()
        .expect("author schema")
}

#[test]
fn statements_and_failures_reach_the_sink() {
    let recorder = Arc::new(Recorder::default());
    let db = Database::new(
        ":memory:",
        Persistor::in_memory().expect("persistor"),
        recorder.clone(),
    );
    let author = author();
    db.create(&author).expect("create");
    let mut ann = Instance::new(&author).with("name", "Ann").expect("instance");
    db.save(&mut ann).expect("save");
    assert_eq!(
        *recorder.info.lock().unwrap(),
        vec![
            "CREATE TABLE IF NOT EXISTS author (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT);",
            "INSERT INTO author (name) VALUES (?);",
        ]
    );
    assert!(recorder.error.lock().unwrap().is_empty());

    let err = db.save(&mut ann).unwrap_err();
    assert!(matches!(err, OrmError::AlreadyPersisted { .. }));
    let errors = recorder.error.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0], err.to_string());
}

#[test]
fn missing_rows_are_reported_once() {
    let recorder = Arc::new(Recorder::default());
    let db = Database::new(
        ":memory:",
        Persistor::in_memory().expect("persistor"),
        recorder.clone(),
    );
    let author = author();
    db.create(&author).expect("create");

    let err = db.get(&author, 999).unwrap_err();
    assert!(matches!(err, OrmError::NotFound { id: 999, .. }));
    assert_eq!(*recorder.error.lock().unwrap(), vec![err.to_string()]);

    // a missing row on delete goes through the same path
    let mut ghost = Instance::new(&author).with("name", "Ghost").expect("instance");
    db.save(&mut ghost).expect("save");
    db.delete(&ghost).expect("delete");
    let err = db.delete(&ghost).unwrap_err();
    assert!(matches!(err, OrmError::NotFound { .. }));
    let errors = recorder.error.lock().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[1], err.to_string());
}

#[test]
fn statement_logging_can_be_switched_off() {
    let recorder = Arc::new(Recorder::default());
    let mut settings = Settings::in_memory();
    settings.database.log_statements = false;
    let db = Database::from_settings_with_sink(&settings, recorder.clone()).expect("db");
    let author = author();
    db.create(&author).expect("create");
    assert!(db.all(&author).expect("all").is_empty());
    assert!(recorder.info.lock().unwrap().is_empty());

    // driver failures are still reported
    let missing = Schema::builder("Missing").build().expect("schema");
    assert!(matches!(db.all(&missing), Err(OrmError::Persistence(_))));
    assert_eq!(recorder.error.lock().unwrap().len(), 1);
}

#[test]
fn tracing_sink_is_the_default() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    TracingSink.info("tracing sink smoke test");
    let db = Database::open_in_memory().expect("db");
    db.create(&author()).expect("create");
    assert_eq!(db.tables().expect("tables"), vec!["author"]);
}
