//! Request middleware.

pub(crate) mod mode;
pub(crate) mod security;
