use crate::core::query_cache::{CacheBucket, QueryCache};
use crate::domain::models::{Identity, NewQuestion, NewTest, Question, UserProfile};
use crate::domain::types::{BackendRole, TestStatus};
use crate::services::backend::{BackendError, BackendHandle};

/// Query and mutation wrappers around the exam backend.
///
/// Each wrapper issues exactly one remote call. Mutations invalidate their
/// cache bucket only after the call succeeded; failures are logged and
/// returned as-is, never retried.
#[derive(Clone)]
pub(crate) struct Queries {
    backend: BackendHandle,
    cache: QueryCache,
}

impl Queries {
    pub(crate) fn new(backend: BackendHandle, cache: QueryCache) -> Self {
        Self { backend, cache }
    }

    pub(crate) fn backend(&self) -> &BackendHandle {
        &self.backend
    }

    pub(crate) fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub(crate) async fn create_question(
        &self,
        caller: &Identity,
        question: &NewQuestion,
    ) -> Result<(), BackendError> {
        let result = async { self.backend.get().await?.create_question(caller, question).await };
        observe("createQuestion", result.await)?;

        self.cache.invalidate(CacheBucket::Questions).await;
        Ok(())
    }

    pub(crate) async fn get_all_questions(
        &self,
        caller: &Identity,
    ) -> Result<Vec<Question>, BackendError> {
        let ticket = self.cache.ticket(CacheBucket::Questions, caller.principal()).await;
        if let Some(cached) = self.cache.get(&ticket).await {
            return Ok(cached);
        }

        let result = async { self.backend.get().await?.get_all_questions(caller).await };
        let questions = observe("getAllQuestions", result.await)?;

        // Dropped if a mutation invalidated the bucket while the fetch ran.
        self.cache.put(ticket, &questions).await;
        Ok(questions)
    }

    pub(crate) async fn get_question(
        &self,
        caller: &Identity,
        id: u64,
    ) -> Result<Option<Question>, BackendError> {
        let result = async { self.backend.get().await?.get_question(caller, id).await };
        observe("getQuestion", result.await)
    }

    pub(crate) async fn delete_question(
        &self,
        caller: &Identity,
        id: u64,
    ) -> Result<bool, BackendError> {
        let result = async { self.backend.get().await?.delete_question(caller, id).await };
        let deleted = observe("deleteQuestion", result.await)?;

        self.cache.invalidate(CacheBucket::Questions).await;
        Ok(deleted)
    }

    pub(crate) async fn create_test(
        &self,
        caller: &Identity,
        test: &NewTest,
    ) -> Result<String, BackendError> {
        let result = async { self.backend.get().await?.create_test(caller, test).await };
        let test_id = observe("createTest", result.await)?;

        self.cache.invalidate(CacheBucket::Tests).await;
        Ok(test_id)
    }

    pub(crate) async fn update_test_status(
        &self,
        caller: &Identity,
        test_id: &str,
        status: TestStatus,
    ) -> Result<(), BackendError> {
        let result =
            async { self.backend.get().await?.update_test_status(caller, test_id, status).await };
        observe("updateTestStatus", result.await)?;

        self.cache.invalidate(CacheBucket::Tests).await;
        Ok(())
    }

    pub(crate) async fn get_caller_user_profile(
        &self,
        caller: &Identity,
    ) -> Result<Option<UserProfile>, BackendError> {
        let result = async { self.backend.get().await?.get_caller_user_profile(caller).await };
        observe("getCallerUserProfile", result.await)
    }

    pub(crate) async fn save_caller_user_profile(
        &self,
        caller: &Identity,
        profile: &UserProfile,
    ) -> Result<(), BackendError> {
        let result =
            async { self.backend.get().await?.save_caller_user_profile(caller, profile).await };
        observe("saveCallerUserProfile", result.await)
    }

    pub(crate) async fn get_caller_user_role(
        &self,
        caller: &Identity,
    ) -> Result<BackendRole, BackendError> {
        let result = async { self.backend.get().await?.get_caller_user_role(caller).await };
        observe("getCallerUserRole", result.await)
    }

    pub(crate) async fn assign_caller_user_role(
        &self,
        caller: &Identity,
        user: &str,
        role: BackendRole,
    ) -> Result<(), BackendError> {
        let result =
            async { self.backend.get().await?.assign_caller_user_role(caller, user, role).await };
        observe("assignCallerUserRole", result.await)
    }

    pub(crate) async fn is_caller_admin(&self, caller: &Identity) -> Result<bool, BackendError> {
        let result = async { self.backend.get().await?.is_caller_admin(caller).await };
        observe("isCallerAdmin", result.await)
    }

    pub(crate) async fn get_user_profile(
        &self,
        caller: &Identity,
        user: &str,
    ) -> Result<Option<UserProfile>, BackendError> {
        let result = async { self.backend.get().await?.get_user_profile(caller, user).await };
        observe("getUserProfile", result.await)
    }
}

fn observe<T>(operation: &'static str, result: Result<T, BackendError>) -> Result<T, BackendError> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(BackendError::NotInitialized) => "not_initialized",
        Err(BackendError::Transport { .. }) => "transport",
        Err(BackendError::Rejected { .. }) => "rejected",
        Err(BackendError::Decode { .. }) => "decode",
    };
    metrics::counter!("backend_calls_total", "operation" => operation, "outcome" => outcome)
        .increment(1);

    if let Err(err) = &result {
        tracing::error!(operation, error = %err, "Exam backend call failed");
    }

    result
}
