pub mod chat;
pub mod error;
pub mod fixed;
pub mod provider;
pub mod worker;

pub use chat::{ChatProvider, ChatSettings};
pub use error::ProviderError;
pub use fixed::StaticProvider;
pub use provider::{ContentProvider, Passages, Profiles, SelectionContext};
pub use worker::{
    Deliver, Dispatch, Generated, GenerationJob, GenerationOutcome, GenerationRequest,
    GenerationWorker, JobId, ProfileSource, run_request,
};
