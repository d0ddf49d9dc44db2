//! AI generation gateway

mod origin;
mod service;

pub use origin::{OriginCheck, OriginPolicy};
pub use service::{
    Admission, CallerContext, GatewayOutcome, GatewayReply, GatewayRequest, GatewayService,
    GenerationResult, ModelDefaults,
};
