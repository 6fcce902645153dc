use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

use super::{BackendError, ExamBackend};
use crate::core::config::BackendSettings;
use crate::domain::models::{Identity, ImageUpload, NewQuestion, NewTest, Question, UserProfile};
use crate::domain::types::{BackendRole, TestStatus};

const MAX_ERROR_MESSAGE_CHARS: usize = 200;

/// JSON-over-HTTP client for the exam backend. Each operation is a `POST` to
/// `{base_url}/{operation}` authorized with the caller's bearer token.
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BlobPayload {
    content_base64: String,
    mime_type: String,
    sha256: String,
}

impl BlobPayload {
    fn from_upload(upload: &ImageUpload) -> Self {
        Self {
            content_base64: STANDARD.encode(&upload.bytes),
            mime_type: upload.mime_type.clone(),
            sha256: hex::encode(Sha256::digest(&upload.bytes)),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateQuestionRequest<'a> {
    class_level: &'a str,
    subject: &'a str,
    chapter: &'a str,
    question_image: Option<BlobPayload>,
    correct_answer: &'a str,
    marks: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTestRequest<'a> {
    test_name: &'a str,
    class_level: &'a str,
    subject: &'a str,
    duration: u32,
    marks_per_question: u8,
    question_ids: &'a [String],
}

impl HttpBackend {
    pub(crate) fn new(base_url: &str, settings: &BackendSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .timeout(Duration::from_secs(settings.request_timeout_seconds))
            .build()
            .context("Failed to build exam backend HTTP client")?;

        Ok(Self { client, base_url: base_url.trim_end_matches('/').to_string() })
    }

    async fn call<B, T>(
        &self,
        caller: &Identity,
        operation: &'static str,
        body: &B,
    ) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let endpoint = format!("{}/{}", self.base_url, operation);
        let mut request = self.client.post(&endpoint).json(body);
        if let Some(token) = caller.token() {
            request = request.bearer_auth(token);
        }

        let transport = |err: reqwest::Error| BackendError::Transport {
            operation,
            message: err.to_string(),
        };

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let raw = response.bytes().await.map_err(transport)?;

        tracing::debug!(operation, status = status.as_u16(), bytes = raw.len(), "Exam backend call");

        if !status.is_success() {
            let message = extract_error_message(&raw)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(BackendError::Rejected { operation, status: status.as_u16(), message });
        }

        // Unit-returning operations may answer with an empty body.
        let payload: &[u8] = if raw.is_empty() { b"null" } else { &raw };
        serde_json::from_slice(payload)
            .map_err(|err| BackendError::Decode { operation, message: err.to_string() })
    }
}

fn extract_error_message(raw: &[u8]) -> Option<String> {
    if let Ok(parsed) = serde_json::from_slice::<Value>(raw) {
        for key in ["detail", "message", "error"] {
            if let Some(text) = parsed.get(key).and_then(Value::as_str) {
                return Some(text.to_string());
            }
        }
    }

    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.chars().take(MAX_ERROR_MESSAGE_CHARS).collect())
}

#[async_trait]
impl ExamBackend for HttpBackend {
    async fn create_question(
        &self,
        caller: &Identity,
        question: &NewQuestion,
    ) -> Result<(), BackendError> {
        let request = CreateQuestionRequest {
            class_level: &question.class_level,
            subject: &question.subject,
            chapter: &question.chapter,
            question_image: question.image.as_ref().map(BlobPayload::from_upload),
            correct_answer: question.correct_answer.as_str(),
            marks: question.marks,
        };
        self.call(caller, "createQuestion", &request).await
    }

    async fn get_all_questions(&self, caller: &Identity) -> Result<Vec<Question>, BackendError> {
        self.call(caller, "getAllQuestions", &json!({})).await
    }

    async fn get_question(
        &self,
        caller: &Identity,
        id: u64,
    ) -> Result<Option<Question>, BackendError> {
        self.call(caller, "getQuestion", &json!({ "id": id })).await
    }

    async fn delete_question(&self, caller: &Identity, id: u64) -> Result<bool, BackendError> {
        self.call(caller, "deleteQuestion", &json!({ "id": id })).await
    }

    async fn create_test(&self, caller: &Identity, test: &NewTest) -> Result<String, BackendError> {
        let request = CreateTestRequest {
            test_name: &test.name,
            class_level: &test.class_level,
            subject: &test.subject,
            duration: test.duration_minutes,
            marks_per_question: test.marks_per_question.value(),
            question_ids: &test.question_ids,
        };
        self.call(caller, "createTest", &request).await
    }

    async fn update_test_status(
        &self,
        caller: &Identity,
        test_id: &str,
        status: TestStatus,
    ) -> Result<(), BackendError> {
        self.call(caller, "updateTestStatus", &json!({ "testId": test_id, "status": status }))
            .await
    }

    async fn get_caller_user_profile(
        &self,
        caller: &Identity,
    ) -> Result<Option<UserProfile>, BackendError> {
        self.call(caller, "getCallerUserProfile", &json!({})).await
    }

    async fn save_caller_user_profile(
        &self,
        caller: &Identity,
        profile: &UserProfile,
    ) -> Result<(), BackendError> {
        self.call(caller, "saveCallerUserProfile", &json!({ "profile": profile })).await
    }

    async fn get_caller_user_role(&self, caller: &Identity) -> Result<BackendRole, BackendError> {
        self.call(caller, "getCallerUserRole", &json!({})).await
    }

    async fn assign_caller_user_role(
        &self,
        caller: &Identity,
        user: &str,
        role: BackendRole,
    ) -> Result<(), BackendError> {
        self.call(caller, "assignCallerUserRole", &json!({ "user": user, "role": role })).await
    }

    async fn is_caller_admin(&self, caller: &Identity) -> Result<bool, BackendError> {
        self.call(caller, "isCallerAdmin", &json!({})).await
    }

    async fn get_user_profile(
        &self,
        caller: &Identity,
        user: &str,
    ) -> Result<Option<UserProfile>, BackendError> {
        self.call(caller, "getUserProfile", &json!({ "user": user })).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::{Json, Router};

    use super::*;
    use crate::domain::types::{AnswerOption, MarksPerQuestion};

    type Recorded = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

    async fn fake_backend(
        State(recorded): State<Recorded>,
        Path(operation): Path<String>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string);
        recorded.lock().expect("recorded").push((operation.clone(), auth, body));

        match operation.as_str() {
            "createQuestion" => Json(Value::Null).into_response(),
            "createTest" => Json(json!("test-42")).into_response(),
            "getAllQuestions" => Json(json!([{
                "id": 3,
                "classLevel": "12th",
                "subject": "Maths",
                "chapter": "Integrals",
                "correctAnswer": "D",
                "marks": 4,
                "createdAt": 1_735_813_230_000_000_000_i64,
                "questionImage": { "directUrl": "https://blobs.example/q3.png" }
            }]))
            .into_response(),
            "deleteQuestion" => {
                (StatusCode::FORBIDDEN, Json(json!({ "detail": "Unauthorized" }))).into_response()
            }
            "updateTestStatus" => StatusCode::NO_CONTENT.into_response(),
            "getCallerUserRole" => Json(json!("guest")).into_response(),
            "isCallerAdmin" => Json(json!("yes")).into_response(),
            _ => StatusCode::NOT_FOUND.into_response(),
        }
    }

    async fn spawn_backend() -> (HttpBackend, Recorded) {
        let recorded: Recorded = Arc::default();
        let app = Router::new().route("/:operation", post(fake_backend)).with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        (client(&format!("http://{addr}/")), recorded)
    }

    fn client(base_url: &str) -> HttpBackend {
        let settings = BackendSettings {
            base_url: Some(base_url.to_string()),
            connect_timeout_seconds: 2,
            request_timeout_seconds: 5,
        };
        HttpBackend::new(base_url, &settings).expect("client")
    }

    fn caller() -> Identity {
        Identity::new("rrkah-fqaaa-aaaaa-aaaaq-cai", Some("caller-token".to_string()))
    }

    #[tokio::test]
    async fn create_test_sends_camel_case_payload_with_bearer() {
        let (backend, recorded) = spawn_backend().await;
        let test = NewTest {
            name: "Unit 1".to_string(),
            class_level: "11th".to_string(),
            subject: "Physics".to_string(),
            duration_minutes: 60,
            marks_per_question: MarksPerQuestion::Two,
            question_ids: vec!["1".to_string(), "4".to_string()],
        };

        let id = backend.create_test(&caller(), &test).await.expect("create test");
        assert_eq!(id, "test-42");

        let recorded = recorded.lock().expect("recorded");
        let (operation, auth, body) = &recorded[0];
        assert_eq!(operation, "createTest");
        assert_eq!(auth.as_deref(), Some("Bearer caller-token"));
        assert_eq!(body["testName"], "Unit 1");
        assert_eq!(body["marksPerQuestion"], 2);
        assert_eq!(body["questionIds"], json!(["1", "4"]));
    }

    #[tokio::test]
    async fn create_question_ships_image_with_digest() {
        let (backend, recorded) = spawn_backend().await;
        let bytes = b"\x89PNG fake image".to_vec();
        let question = NewQuestion {
            class_level: "11th".to_string(),
            subject: "Chemistry".to_string(),
            chapter: "Mole Concept".to_string(),
            image: Some(ImageUpload { bytes: bytes.clone(), mime_type: "image/png".to_string() }),
            correct_answer: AnswerOption::B,
            marks: 4,
        };

        backend.create_question(&caller(), &question).await.expect("create question");

        let recorded = recorded.lock().expect("recorded");
        let image = &recorded[0].2["questionImage"];
        assert_eq!(image["mimeType"], "image/png");
        assert_eq!(image["contentBase64"], STANDARD.encode(&bytes));
        assert_eq!(image["sha256"], hex::encode(Sha256::digest(&bytes)));
        assert_eq!(recorded[0].2["correctAnswer"], "B");
    }

    #[tokio::test]
    async fn get_all_questions_decodes_list() {
        let (backend, _) = spawn_backend().await;

        let questions = backend.get_all_questions(&caller()).await.expect("questions");
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].chapter, "Integrals");
        assert_eq!(
            questions[0].question_image.as_ref().map(|image| image.direct_url.as_str()),
            Some("https://blobs.example/q3.png")
        );
    }

    #[tokio::test]
    async fn rejection_carries_backend_detail() {
        let (backend, _) = spawn_backend().await;

        let err = backend.delete_question(&caller(), 9).await.expect_err("rejected");
        match err {
            BackendError::Rejected { operation, status, message } => {
                assert_eq!(operation, "deleteQuestion");
                assert_eq!(status, 403);
                assert_eq!(message, "Unauthorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_body_is_accepted_for_unit_operations() {
        let (backend, _) = spawn_backend().await;
        backend
            .update_test_status(&caller(), "test-42", TestStatus::Published)
            .await
            .expect("status update");
    }

    #[tokio::test]
    async fn anonymous_caller_sends_no_authorization() {
        let (backend, recorded) = spawn_backend().await;

        let role = backend.get_caller_user_role(&Identity::anonymous()).await.expect("role");
        assert_eq!(role, BackendRole::Guest);
        assert_eq!(recorded.lock().expect("recorded")[0].1, None);
    }

    #[tokio::test]
    async fn unexpected_payload_is_a_decode_error() {
        let (backend, _) = spawn_backend().await;

        let err = backend.is_caller_admin(&caller()).await.expect_err("string is not a bool");
        assert!(matches!(err, BackendError::Decode { operation: "isCallerAdmin", .. }));
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_error() {
        let backend = client("http://127.0.0.1:1");

        let err = backend.is_caller_admin(&caller()).await.expect_err("nothing listens");
        assert!(matches!(err, BackendError::Transport { .. }));
    }

    #[test]
    fn error_message_falls_back_to_plain_text() {
        assert_eq!(extract_error_message(b"{\"message\":\"nope\"}").as_deref(), Some("nope"));
        assert_eq!(extract_error_message(b"  boom  ").as_deref(), Some("boom"));
        assert_eq!(extract_error_message(b""), None);
    }
}
