pub(crate) mod admin;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod pages;
pub(crate) mod profile;
pub(crate) mod router;
pub(crate) mod validation;
