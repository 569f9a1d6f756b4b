//! Command handlers grouped by concern.

pub(crate) mod db;
pub(crate) mod query;
