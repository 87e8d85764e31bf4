//! Caller-driven task lifecycle: Pending → In Progress → Finished / Canceled.

mod common;

use common::scripted_client;
use compredict_client::transport::Method;
use compredict_client::{FitOptions, TaskStatus};
use serde_json::json;

#[test]
fn test_poll_until_terminal() {
    let (client, transport) = scripted_client();
    transport.reply(200, r#"{"job_id": "fit-7", "status": "Pending"}"#);
    transport.reply(200, r#"{"job_id": "fit-7", "status": "In Progress"}"#);
    transport.reply(200, r#"{"job_id": "fit-7", "status": "In Progress"}"#);
    transport.reply(
        200,
        r#"{"job_id": "fit-7", "status": "Finished", "success": true,
            "predictions": null, "evaluations": {"r2": 0.93}, "new_version": "1.1.0"}"#,
    );

    let mut task = client
        .train_algorithm("ecolife", json!([]), &FitOptions::new().version("1.0.0"))
        .unwrap()
        .into_resource()
        .unwrap();

    let mut seen = vec![task.current_status()];
    while !task.is_terminal() {
        assert!(task.update().unwrap());
        seen.push(task.current_status());
    }

    assert_eq!(
        seen,
        vec![
            TaskStatus::Pending,
            TaskStatus::InProgress,
            TaskStatus::InProgress,
            TaskStatus::Finished
        ]
    );
    assert_eq!(task.success(), Some(true));
    assert_eq!(task.predictions(), None);
    assert_eq!(task.evaluations(), Some(&json!({"r2": 0.93})));
    assert_eq!(task.field("new_version"), Some(&json!("1.1.0")));

    let requests = transport.requests();
    assert_eq!(requests.len(), 4);
    assert_eq!(requests[0].method, Method::Post);
    assert!(requests[1..]
        .iter()
        .all(|r| r.method == Method::Get && r.url == "https://core.test/api/v1/algorithms/tasks/fit-7"));
}

#[test]
fn test_failed_refresh_leaves_task_untouched() {
    let (client, transport) = scripted_client();
    transport.reply(200, r#"{"job_id": "j", "status": "In Progress", "callback_param": {"car": 1}}"#);
    transport.reply(500, r#"{"error": "Internal error"}"#);

    let mut task = client.get_task_result("j").unwrap().into_resource().unwrap();
    assert!(!task.update().unwrap());
    assert_eq!(task.current_status(), TaskStatus::InProgress);
    assert_eq!(task.callback_param(), Some(&json!({"car": 1})));
    assert_eq!(client.last_error(), Some(json!({"error": "Internal error"})));
    assert_eq!(client.last_status(), Some(500));
}

#[test]
fn test_cancel_rejected_by_service() {
    let (client, transport) = scripted_client();
    transport.reply(200, r#"{"job_id": "j", "status": "Pending"}"#);
    transport.reply(409, r#"{"errors": ["task already running"]}"#);

    let mut task = client.get_task_result("j").unwrap().into_resource().unwrap();
    assert!(!task.cancel().unwrap());
    assert_eq!(task.current_status(), TaskStatus::Pending);
    assert_eq!(transport.requests()[1].method, Method::Delete);
}

#[test]
fn test_failed_task_reports_error_without_results() {
    let (client, transport) = scripted_client();
    transport.reply(
        200,
        r#"{"job_id": "j", "status": "Finished", "success": false,
            "error": {"code": "E42", "message": "bad features"}, "predictions": [1]}"#,
    );

    let task = client.get_task_result("j").unwrap().into_resource().unwrap();
    assert!(task.is_terminal());
    assert_eq!(task.success(), Some(false));
    assert_eq!(task.error().and_then(|e| e.get("code")), Some(&json!("E42")));
    assert_eq!(task.predictions(), None);
}
