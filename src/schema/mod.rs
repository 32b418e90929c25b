//! Schema module - request and job configuration types.

mod job;
mod request;

pub use job::*;
pub use request::*;
