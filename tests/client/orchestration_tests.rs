use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use xexec::config::DevConfig;
use xexec::{
    create_or_reuse, DevSession, EchoHandler, ExecutionRequest, ExecutionStatus, LocalEngine,
    ManagementApi, ProcessDefinition, ProcessStep, StopSignal, Transport, TransportError,
};

use super::helpers::{with_timeout, CapturedLogs};

fn definition() -> ProcessDefinition {
    ProcessDefinition {
        name: "pipeline".into(),
        env: BTreeMap::from([("MODE".to_string(), "dev".to_string())]),
        steps: vec![ProcessStep {
            key: "first".into(),
            task_key: "echo".into(),
        }],
    }
}

#[tokio::test]
async fn test_existing_process_is_reused() {
    let engine = LocalEngine::default();
    let existing = engine.create_process(definition()).await.unwrap();

    let logs = CapturedLogs::default();
    let guard = logs.install();
    let (hash, created) = create_or_reuse(&engine, definition()).await.unwrap();
    drop(guard);

    assert_eq!(hash, existing.hash);
    assert!(!created);
    assert!(engine.get_process(hash).await.is_ok());

    let warnings = logs.warnings();
    assert_eq!(warnings.len(), 1, "{:?}", warnings);
    assert!(warnings[0].contains("already exists"), "{}", warnings[0]);
    assert!(warnings[0].contains(&hash.to_string()), "{}", warnings[0]);
}

#[tokio::test]
async fn test_new_process_is_created() {
    let engine = LocalEngine::default();

    let logs = CapturedLogs::default();
    let guard = logs.install();
    let (hash, created) = create_or_reuse(&engine, definition()).await.unwrap();
    drop(guard);

    assert!(created);
    assert_eq!(hash, definition().hash().unwrap());
    assert!(logs.warnings().is_empty(), "{:?}", logs.warnings());
}

#[tokio::test]
async fn test_invalid_definition_is_an_error() {
    let engine = LocalEngine::default();
    let mut bad = definition();
    bad.name = " ".into();
    assert!(create_or_reuse(&engine, bad).await.is_err());
}

#[tokio::test]
async fn test_dev_session_tails_logs_and_tears_down() {
    let engine = LocalEngine::default();
    let instance = engine.register_instance("echo", Arc::new(EchoHandler));

    let mut session =
        DevSession::start(Arc::new(engine.clone()), definition(), &DevConfig::default())
            .await
            .unwrap();
    assert!(session.created());
    let process = session.process_hash();

    engine
        .create_execution(ExecutionRequest::new(instance, "echo").with_process(process))
        .await
        .unwrap();

    let stop = StopSignal::new();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let trigger = stop.clone();
    with_timeout(
        "dev session",
        Duration::from_secs(5),
        session.run_until(&stop, move |execution| {
            log.lock().push(execution.status);
            if execution.status.is_terminal() {
                trigger.trigger();
            }
        }),
    )
    .await
    .unwrap();

    assert_eq!(
        *seen.lock(),
        vec![
            ExecutionStatus::Pending,
            ExecutionStatus::Running,
            ExecutionStatus::Completed
        ]
    );
    assert!(matches!(
        engine.get_process(process).await,
        Err(TransportError::NotFound(_))
    ));
    assert_eq!(engine.open_streams(), 0);
}

#[tokio::test]
async fn test_reused_process_survives_teardown() {
    let engine = LocalEngine::default();
    engine.create_process(definition()).await.unwrap();

    let mut session =
        DevSession::start(Arc::new(engine.clone()), definition(), &DevConfig::default())
            .await
            .unwrap();
    assert!(!session.created());

    let stop = StopSignal::new();
    stop.trigger();
    session.run_until(&stop, |_| {}).await.unwrap();

    assert!(engine.get_process(session.process_hash()).await.is_ok());
    assert_eq!(engine.open_streams(), 0);
}

#[tokio::test]
async fn test_delete_on_exit_can_be_disabled() {
    let engine = LocalEngine::default();
    let config = DevConfig {
        delete_on_exit: false,
    };

    let mut session = DevSession::start(Arc::new(engine.clone()), definition(), &config)
        .await
        .unwrap();
    session.teardown().await.unwrap();
    session.teardown().await.unwrap();

    assert!(engine.get_process(session.process_hash()).await.is_ok());
    assert_eq!(engine.open_streams(), 0);
}
