use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use time::OffsetDateTime;
use tokio::sync::{oneshot, Mutex, OwnedMutexGuard};

use crate::api;
use crate::core::{
    config::Settings, query_cache::QueryCache, redis::RedisHandle, security, state::AppState,
};
use crate::domain::models::{
    Identity, ImageRef, NewQuestion, NewTest, Question, UserProfile,
};
use crate::domain::types::{AnswerOption, BackendRole, TestStatus};
use crate::services::backend::{BackendError, BackendHandle, ExamBackend};
use crate::services::queries::Queries;

pub(crate) const ADMIN_PRINCIPAL: &str =
    "jqvc4-5tjdu-a3br6-pm2i3-cgbcq-umfiv-r2kcw-z4hju-ox52z-apmjw-eqe";
pub(crate) const STUDENT_PRINCIPAL: &str = "rrkah-fqaaa-aaaaa-aaaaq-cai";
const TEST_IDENTITY_SECRET: &str = "test-identity-secret";

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) app: Router,
    pub(crate) backend: Arc<InMemoryBackend>,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(Mutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("DELTA_ENV", "test");
    std::env::set_var("DELTA_STRICT_CONFIG", "0");
    std::env::set_var("IDENTITY_TOKEN_SECRET", TEST_IDENTITY_SECRET);
    std::env::remove_var("IDENTITY_TOKEN_ALGORITHM");
    std::env::set_var("ADMIN_PRINCIPALS", ADMIN_PRINCIPAL);
    std::env::remove_var("EXAM_BACKEND_URL");
    std::env::remove_var("IMAGE_COMPRESSION_THRESHOLD_KB");
    std::env::remove_var("IMAGE_MAX_DIMENSION");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::set_var("QUERY_CACHE_REDIS", "0");
    std::env::set_var("QUERY_CACHE_TTL_SECONDS", "60");
}

/// Router and state wired to an in-memory backend seeded with `question_bank()`.
pub(crate) async fn setup_test_context() -> TestContext {
    let backend = Arc::new(InMemoryBackend::with_questions(question_bank()));
    let mut context = setup_test_context_without_backend().await;
    context.state.queries().backend().install(backend.clone()).await;
    context.backend = backend;
    context
}

/// Same wiring, but the backend slot stays empty.
pub(crate) async fn setup_test_context_without_backend() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let redis = RedisHandle::new(settings.redis().redis_url());
    let queries = Queries::new(BackendHandle::new(), QueryCache::new(settings.cache(), None));
    let state = AppState::new(settings, queries, redis);
    let app = api::router::router(state.clone());

    TestContext { state, app, backend: Arc::new(InMemoryBackend::default()), _guard: guard }
}

pub(crate) fn bearer_token(principal: &str, settings: &Settings) -> String {
    security::issue_identity_token(principal, settings, None).expect("token")
}

pub(crate) fn question(id: u64, class_level: &str, subject: &str, chapter: &str) -> Question {
    Question {
        id,
        class_level: class_level.to_string(),
        subject: subject.to_string(),
        chapter: chapter.to_string(),
        correct_answer: AnswerOption::A,
        marks: 4,
        created_at: 1_735_813_230_000_000_000 + id as i64,
        question_image: None,
    }
}

pub(crate) fn question_bank() -> Vec<Question> {
    vec![
        question(1, "11th", "Physics", "Kinematics"),
        question(2, "12th", "Physics", "Electrostatics"),
        question(3, "11th", "Chemistry", "Mole Concept"),
        question(4, "11th", "Physics", "Laws of Motion"),
    ]
}

#[derive(Debug, Clone)]
pub(crate) struct StoredTest {
    pub(crate) test: NewTest,
    pub(crate) status: TestStatus,
}

#[derive(Default)]
struct BackendState {
    questions: Vec<Question>,
    tests: HashMap<String, StoredTest>,
    profiles: HashMap<String, UserProfile>,
    roles: HashMap<String, BackendRole>,
    next_test: u64,
    failing: bool,
    calls: Vec<(&'static str, String)>,
}

/// In-process stand-in for the exam backend. Every call is recorded with the
/// caller principal; `set_failing(true)` makes every call a rejection.
#[derive(Default)]
pub(crate) struct InMemoryBackend {
    state: StdMutex<BackendState>,
    list_gate: StdMutex<Option<ListGate>>,
}

struct ListGate {
    fetched: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

impl InMemoryBackend {
    pub(crate) fn with_questions(questions: Vec<Question>) -> Self {
        Self {
            state: StdMutex::new(BackendState { questions, ..BackendState::default() }),
            list_gate: StdMutex::new(None),
        }
    }

    pub(crate) fn insert_question(&self, question: Question) {
        self.lock().questions.push(question);
    }

    pub(crate) fn questions(&self) -> Vec<Question> {
        self.lock().questions.clone()
    }

    pub(crate) fn stored_test(&self, id: &str) -> Option<StoredTest> {
        self.lock().tests.get(id).cloned()
    }

    pub(crate) fn test_status(&self, id: &str) -> Option<TestStatus> {
        self.stored_test(id).map(|stored| stored.status)
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// The next `getAllQuestions` reads the bank, signals `fetched`, then
    /// waits for `release` before answering with what it read.
    pub(crate) fn stall_next_list(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (fetched_tx, fetched_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.list_gate.lock().expect("list gate") =
            Some(ListGate { fetched: fetched_tx, release: release_rx });
        (fetched_rx, release_tx)
    }

    pub(crate) fn calls(&self) -> Vec<(&'static str, String)> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().expect("backend state")
    }

    fn begin(
        &self,
        operation: &'static str,
        caller: &Identity,
    ) -> Result<MutexGuard<'_, BackendState>, BackendError> {
        let mut state = self.lock();
        state.calls.push((operation, caller.principal().to_string()));
        if state.failing {
            return Err(BackendError::Rejected {
                operation,
                status: 500,
                message: "canister trapped".to_string(),
            });
        }
        Ok(state)
    }
}

#[async_trait]
impl ExamBackend for InMemoryBackend {
    async fn create_question(
        &self,
        caller: &Identity,
        question: &NewQuestion,
    ) -> Result<(), BackendError> {
        let mut state = self.begin("createQuestion", caller)?;
        let id = state.questions.iter().map(|existing| existing.id).max().unwrap_or(0) + 1;
        let question_image = question
            .image
            .as_ref()
            .map(|_| ImageRef { direct_url: format!("memory://questions/{id}") });

        state.questions.push(Question {
            id,
            class_level: question.class_level.clone(),
            subject: question.subject.clone(),
            chapter: question.chapter.clone(),
            correct_answer: question.correct_answer,
            marks: question.marks,
            created_at: OffsetDateTime::now_utc().unix_timestamp_nanos() as i64,
            question_image,
        });
        Ok(())
    }

    async fn get_all_questions(&self, caller: &Identity) -> Result<Vec<Question>, BackendError> {
        let questions = self.begin("getAllQuestions", caller)?.questions.clone();

        let gate = self.list_gate.lock().expect("list gate").take();
        if let Some(gate) = gate {
            let _ = gate.fetched.send(());
            let _ = gate.release.await;
        }
        Ok(questions)
    }

    async fn get_question(
        &self,
        caller: &Identity,
        id: u64,
    ) -> Result<Option<Question>, BackendError> {
        let state = self.begin("getQuestion", caller)?;
        Ok(state.questions.iter().find(|question| question.id == id).cloned())
    }

    async fn delete_question(&self, caller: &Identity, id: u64) -> Result<bool, BackendError> {
        let mut state = self.begin("deleteQuestion", caller)?;
        let before = state.questions.len();
        state.questions.retain(|question| question.id != id);
        Ok(state.questions.len() != before)
    }

    async fn create_test(&self, caller: &Identity, test: &NewTest) -> Result<String, BackendError> {
        let mut state = self.begin("createTest", caller)?;
        state.next_test += 1;
        let id = format!("test-{}", state.next_test);
        state.tests.insert(id.clone(), StoredTest { test: test.clone(), status: TestStatus::Draft });
        Ok(id)
    }

    async fn update_test_status(
        &self,
        caller: &Identity,
        test_id: &str,
        status: TestStatus,
    ) -> Result<(), BackendError> {
        let mut state = self.begin("updateTestStatus", caller)?;
        match state.tests.get_mut(test_id) {
            Some(stored) => {
                stored.status = status;
                Ok(())
            }
            None => Err(BackendError::Rejected {
                operation: "updateTestStatus",
                status: 404,
                message: "Test not found".to_string(),
            }),
        }
    }

    async fn get_caller_user_profile(
        &self,
        caller: &Identity,
    ) -> Result<Option<UserProfile>, BackendError> {
        let state = self.begin("getCallerUserProfile", caller)?;
        Ok(state.profiles.get(caller.principal()).cloned())
    }

    async fn save_caller_user_profile(
        &self,
        caller: &Identity,
        profile: &UserProfile,
    ) -> Result<(), BackendError> {
        let mut state = self.begin("saveCallerUserProfile", caller)?;
        state.profiles.insert(caller.principal().to_string(), profile.clone());
        Ok(())
    }

    async fn get_caller_user_role(&self, caller: &Identity) -> Result<BackendRole, BackendError> {
        let state = self.begin("getCallerUserRole", caller)?;
        Ok(state.roles.get(caller.principal()).copied().unwrap_or(BackendRole::Guest))
    }

    async fn assign_caller_user_role(
        &self,
        caller: &Identity,
        user: &str,
        role: BackendRole,
    ) -> Result<(), BackendError> {
        let mut state = self.begin("assignCallerUserRole", caller)?;
        state.roles.insert(user.to_string(), role);
        Ok(())
    }

    async fn is_caller_admin(&self, caller: &Identity) -> Result<bool, BackendError> {
        let state = self.begin("isCallerAdmin", caller)?;
        Ok(state.roles.get(caller.principal()) == Some(&BackendRole::Admin))
    }

    async fn get_user_profile(
        &self,
        caller: &Identity,
        user: &str,
    ) -> Result<Option<UserProfile>, BackendError> {
        let state = self.begin("getUserProfile", caller)?;
        Ok(state.profiles.get(user).cloned())
    }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) enum FormPart<'a> {
    Text(&'a str, &'a str),
    File { name: &'a str, filename: &'a str, content_type: &'a str, bytes: &'a [u8] },
}

pub(crate) fn multipart_request(uri: &str, token: Option<&str>, parts: &[FormPart<'_>]) -> Request<Body> {
    const BOUNDARY: &str = "delta-test-boundary";
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            FormPart::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            FormPart::File { name, filename, content_type, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    builder.body(Body::from(body)).expect("multipart body")
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}
