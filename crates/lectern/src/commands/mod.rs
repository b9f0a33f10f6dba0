//! CLI command implementations.

mod generate;
mod serve;

pub(crate) use generate::GenArgs;
pub(crate) use serve::ServeArgs;
