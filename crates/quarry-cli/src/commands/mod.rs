//! Command handlers grouped by endpoint concern.

pub(crate) mod auth;
pub(crate) mod files;
pub(crate) mod metrics;
pub(crate) mod query;
pub(crate) mod tables;
