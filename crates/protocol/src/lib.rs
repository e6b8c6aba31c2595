#![forbid(unsafe_code)]

mod dto;
mod field;
pub mod paths;

pub use dto::{
    ErrorBody, HealthResponse, PendingScriptDto, PlaceHeartbeat, PlacesResponse, QueuedResponse,
    ScriptSubmission,
};
