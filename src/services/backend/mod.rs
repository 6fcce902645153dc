//! Remote exam backend boundary.
//!
//! Every operation carries the caller identity; the backend authorizes calls
//! on its own and this crate never second-guesses it.

mod handle;
mod http;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{Identity, NewQuestion, NewTest, Question, UserProfile};
use crate::domain::types::{BackendRole, TestStatus};

pub(crate) use handle::{BackendHandle, BackendHealth};
pub(crate) use http::HttpBackend;

#[derive(Debug, Error)]
pub(crate) enum BackendError {
    #[error("actor not initialized")]
    NotInitialized,
    #[error("{operation} transport failed: {message}")]
    Transport { operation: &'static str, message: String },
    #[error("{operation} rejected with status {status}: {message}")]
    Rejected { operation: &'static str, status: u16, message: String },
    #[error("{operation} returned an unexpected payload: {message}")]
    Decode { operation: &'static str, message: String },
}

#[async_trait]
pub(crate) trait ExamBackend: Send + Sync {
    async fn create_question(
        &self,
        caller: &Identity,
        question: &NewQuestion,
    ) -> Result<(), BackendError>;

    async fn get_all_questions(&self, caller: &Identity) -> Result<Vec<Question>, BackendError>;

    async fn get_question(
        &self,
        caller: &Identity,
        id: u64,
    ) -> Result<Option<Question>, BackendError>;

    /// Returns whether a question with `id` existed and was removed.
    async fn delete_question(&self, caller: &Identity, id: u64) -> Result<bool, BackendError>;

    /// Creates a draft test and returns its id.
    async fn create_test(&self, caller: &Identity, test: &NewTest) -> Result<String, BackendError>;

    async fn update_test_status(
        &self,
        caller: &Identity,
        test_id: &str,
        status: TestStatus,
    ) -> Result<(), BackendError>;

    async fn get_caller_user_profile(
        &self,
        caller: &Identity,
    ) -> Result<Option<UserProfile>, BackendError>;

    async fn save_caller_user_profile(
        &self,
        caller: &Identity,
        profile: &UserProfile,
    ) -> Result<(), BackendError>;

    async fn get_caller_user_role(&self, caller: &Identity) -> Result<BackendRole, BackendError>;

    async fn assign_caller_user_role(
        &self,
        caller: &Identity,
        user: &str,
        role: BackendRole,
    ) -> Result<(), BackendError>;

    async fn is_caller_admin(&self, caller: &Identity) -> Result<bool, BackendError>;

    async fn get_user_profile(
        &self,
        caller: &Identity,
        user: &str,
    ) -> Result<Option<UserProfile>, BackendError>;
}
