pub(crate) mod backend;
pub(crate) mod image_compression;
pub(crate) mod navigation;
pub(crate) mod queries;
pub(crate) mod question_filter;
pub(crate) mod role_resolver;
pub(crate) mod test_drafts;
