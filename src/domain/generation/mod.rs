//! Upstream generation domain

mod provider;
mod request;
mod response;

pub use provider::GenerationProvider;
pub use request::{GenerationKind, GenerationRequest, InlineImage};
pub use response::GenerationOutput;

#[cfg(test)]
pub use provider::mock;
