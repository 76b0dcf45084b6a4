use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assessment_runner::clients::{AssessmentBackend, AssessmentClient};
use assessment_runner::config::Config;
use assessment_runner::error::{ApiError, AppError};
use assessment_runner::infrastructure::{FileTimerStore, HttpExecutor, TimerKey, TimerStore};
use assessment_runner::models::{CandidateResponse, NextStep, QuestionKind, SessionCtx};
use assessment_runner::orchestrator::{RunOutcome, SessionRunner};
use assessment_runner::workflow::{FlowDeps, FlowState, QuestionFlow};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// 内存中的后端状态
#[derive(Default)]
struct Backend {
    answered: HashSet<String>,
    submissions: Vec<Value>,
    next_queries: Vec<Option<String>>,
    next_sessions: Vec<String>,
    question_sessions: Vec<String>,
}

type Shared = Arc<Mutex<Backend>>;

const ORDER: [&str; 2] = ["q1", "q2"];

fn question_json(id: &str) -> Option<Value> {
    match id {
        "q1" => Some(json!({
            "instruction": "Combien font $1+1$ ?",
            "questionType": "MCQ",
            "possibleResponses": [
                {"_id": "a", "possibleResponse": "1"},
                {"_id": "b", "possibleResponse": "2"}
            ],
            "time": 60
        })),
        "q2" => Some(json!({
            "instruction": "Expliquer le borrow checker",
            "questionType": "open",
            "time": 60
        })),
        // 字段为 null、限时为浮点数
        "q3" => Some(json!({
            "instruction": "Décrire un trait",
            "questionType": null,
            "possibleResponses": null,
            "textType": null,
            "time": 45.0
        })),
        _ => None,
    }
}

async fn fetch_test(Path(test_id): Path<String>) -> Result<Json<Value>, StatusCode> {
    if test_id != "t1" {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({
        "title": "Backend Rust",
        "description": "Test technique",
        "numberOfQuestions": 2,
        "maxTime": 120,
        "seniorityLevel": "junior",
        "categories": [{"categoryId": "c1", "categoryName": "Rust", "expertiseLevel": "advanced"}]
    })))
}

async fn next_question(
    State(state): State<Shared>,
    Path(session_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let mut backend = state.lock().unwrap();
    backend.next_sessions.push(session_id);
    let current = params.get("currentQuestionId").cloned();
    backend.next_queries.push(current.clone());

    let next = ORDER
        .iter()
        .find(|id| Some(id.to_string()) != current && !backend.answered.contains(**id));
    Json(json!({ "nextQuestionId": next.copied().unwrap_or("result") }))
}

async fn fetch_question(
    State(state): State<Shared>,
    Path(question_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    let mut backend = state.lock().unwrap();
    backend
        .question_sessions
        .push(params.get("sessionId").cloned().unwrap_or_default());
    question_json(&question_id)
        .map(|question| Json(json!({ "question": question })))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn submit_response(State(state): State<Shared>, Json(body): Json<Value>) -> StatusCode {
    let mut backend = state.lock().unwrap();
    if let Some(id) = body["questionId"].as_str() {
        backend.answered.insert(id.to_string());
    }
    backend.submissions.push(body);
    StatusCode::CREATED
}

/// 在随机端口上启动假后端，返回 base URL 和共享状态
async fn spawn_app() -> (String, Shared) {
    let state = Shared::default();
    let app = Router::new()
        .route("/result/test/{test_id}", get(fetch_test))
        .route("/result/{session_id}/nextQuestion", get(next_question))
        .route("/result/question/{question_id}", get(fetch_question))
        .route("/result/response", post(submit_response))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, state)
}

fn client(address: &str) -> AssessmentClient {
    AssessmentClient::with_executor(
        HttpExecutor::with_base_url(address, Duration::from_secs(5)).unwrap(),
    )
}

#[tokio::test]
async fn client_speaks_the_result_endpoints() {
    let (address, state) = spawn_app().await;
    let client = client(&address);

    let test = client.fetch_test("t1").await.unwrap();
    assert_eq!(test.title, "Backend Rust");
    assert_eq!(test.question_count(), Some(2));
    assert_eq!(test.max_time_minutes(), Some(2));

    assert_eq!(
        client.next_question("s1", None).await.unwrap(),
        NextStep::Question("q1".into())
    );
    assert_eq!(
        client.next_question("s1", Some("q1")).await.unwrap(),
        NextStep::Question("q2".into())
    );

    let question = client.fetch_question("q1", "s1").await.unwrap();
    assert_eq!(question.kind(), QuestionKind::MultipleChoice);
    assert_eq!(question.possible_responses[1].possible_response, "2");

    let ctx = SessionCtx::new("t1", "s1");
    client
        .submit_response(&CandidateResponse::new(&ctx, "q1", "2".to_string()))
        .await
        .unwrap();
    client
        .submit_response(&CandidateResponse::new(&ctx, "q2", String::new()))
        .await
        .unwrap();
    assert_eq!(
        client.next_question("s1", None).await.unwrap(),
        NextStep::Finished
    );

    let backend = state.lock().unwrap();
    assert_eq!(
        backend.next_queries,
        vec![None, Some("q1".to_string()), None]
    );
    assert_eq!(backend.question_sessions, vec!["s1".to_string()]);
    assert_eq!(
        backend.submissions[0],
        json!({"response": "2", "questionId": "q1", "testResultId": "s1", "testId": "t1"})
    );
}

#[tokio::test]
async fn missing_test_maps_to_bad_response() {
    let (address, _state) = spawn_app().await;
    let err = client(&address).fetch_test("inconnu").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(
        err,
        AppError::Api(ApiError::BadResponse {
            code: Some(404),
            ..
        })
    ));
}

#[tokio::test]
async fn full_session_over_http() {
    let (address, state) = spawn_app().await;
    let dir = tempfile::tempdir().unwrap();
    let timers = Arc::new(FileTimerStore::new(dir.path().join("timers.json")));
    let deps = FlowDeps::new(Arc::new(client(&address)), timers.clone(), &Config::default());

    let input: &[u8] = b"\n2\n:submit\nownership\n:submit\n";
    let mut runner = SessionRunner::new(deps, input, Vec::new());
    let outcome = runner.run("t1", Some("s1")).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed { answered: 2 });

    let screen = String::from_utf8(runner.into_output()).unwrap();
    assert!(screen.contains("Ce test comporte 2 questions"));
    assert!(screen.contains("Rust - Avancé"));
    assert!(screen.contains("math-inline"));

    let backend = state.lock().unwrap();
    let responses: Vec<_> = backend
        .submissions
        .iter()
        .map(|s| s["response"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(responses, vec!["2", "ownership"]);
    assert_eq!(timers.load(&TimerKey::new("s1", "q1")).unwrap(), None);
    assert_eq!(timers.load(&TimerKey::new("s1", "q2")).unwrap(), None);
}

#[tokio::test]
async fn countdown_survives_restart_with_file_store() {
    let (address, _state) = spawn_app().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("timers.json");
    let ctx = SessionCtx::new("t1", "s1");

    let deps = FlowDeps::new(
        Arc::new(client(&address)),
        Arc::new(FileTimerStore::new(&path)),
        &Config::default(),
    );
    let mut before = QuestionFlow::new(deps, ctx.clone(), "q1");
    assert_eq!(before.load().await.unwrap(), &FlowState::Ready);
    for _ in 0..5 {
        before.tick().await.unwrap();
    }
    drop(before);

    // 新进程：重新打开同一个文件
    let deps = FlowDeps::new(
        Arc::new(client(&address)),
        Arc::new(FileTimerStore::new(&path)),
        &Config::default(),
    );
    let mut after = QuestionFlow::new(deps, ctx, "q1");
    after.load().await.unwrap();
    assert_eq!(after.remaining_secs(), Some(55));
    assert_eq!(after.remaining_display(), "00:55");
}

#[tokio::test]
async fn unknown_question_redirects_to_next() {
    let (address, _state) = spawn_app().await;
    let dir = tempfile::tempdir().unwrap();
    let deps = FlowDeps::new(
        Arc::new(client(&address)),
        Arc::new(FileTimerStore::new(dir.path().join("timers.json"))),
        &Config::default(),
    );

    let ctx = SessionCtx::new("t1", "s1");
    let mut flow = QuestionFlow::new(deps, ctx, "q9");
    let state = flow.load().await.unwrap().clone();
    assert_eq!(
        state.route().map(|r| r.path()),
        Some("/test/t1/question/q1?sessionId=s1".to_string())
    );
}

#[tokio::test]
async fn question_with_null_fields_is_shown() {
    let (address, state) = spawn_app().await;
    let dir = tempfile::tempdir().unwrap();
    let deps = FlowDeps::new(
        Arc::new(client(&address)),
        Arc::new(FileTimerStore::new(dir.path().join("timers.json"))),
        &Config::default(),
    );

    let mut flow = QuestionFlow::new(deps, SessionCtx::new("t1", "s1"), "q3");
    assert_eq!(flow.load().await.unwrap(), &FlowState::Ready);
    assert_eq!(flow.question().map(|q| q.kind()), Some(QuestionKind::FreeText));
    assert_eq!(flow.remaining_secs(), Some(45));

    flow.append_line("Un ensemble de méthodes").unwrap();
    flow.submit().await.unwrap();
    let backend = state.lock().unwrap();
    assert_eq!(backend.submissions[0]["questionId"], "q3");
}

#[tokio::test]
async fn reserved_characters_stay_inside_one_path_segment() {
    let (address, state) = spawn_app().await;
    let client = client(&address);

    assert_eq!(
        client.next_question("s/1?x#y", Some("q1")).await.unwrap(),
        NextStep::Question("q2".into())
    );

    let backend = state.lock().unwrap();
    assert_eq!(backend.next_sessions, vec!["s/1?x#y".to_string()]);
    assert_eq!(backend.next_queries, vec![Some("q1".to_string())]);
}
