use std::sync::Arc;

use crate::core::{config::Settings, redis::RedisHandle};
use crate::services::queries::Queries;
use crate::services::role_resolver::AdminAllowList;
use crate::services::test_drafts::TestDrafts;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    allow_list: AdminAllowList,
    queries: Queries,
    drafts: TestDrafts,
    redis: RedisHandle,
}

impl AppState {
    pub(crate) fn new(settings: Settings, queries: Queries, redis: RedisHandle) -> Self {
        let allow_list = AdminAllowList::new(settings.access().admin_principals.iter().cloned());

        Self {
            inner: Arc::new(InnerState {
                settings,
                allow_list,
                queries,
                drafts: TestDrafts::new(),
                redis,
            }),
        }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn allow_list(&self) -> &AdminAllowList {
        &self.inner.allow_list
    }

    pub(crate) fn queries(&self) -> &Queries {
        &self.inner.queries
    }

    pub(crate) fn drafts(&self) -> &TestDrafts {
        &self.inner.drafts
    }

    pub(crate) fn redis(&self) -> &RedisHandle {
        &self.inner.redis
    }
}
