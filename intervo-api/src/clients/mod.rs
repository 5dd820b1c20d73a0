//! External collaborators consumed by the interview core
//!
//! Each collaborator is a narrow trait so the orchestrator and gateway depend
//! on abstractions; production implementations are thin HTTP/filesystem
//! adapters, tests substitute in-memory mocks.

pub mod ai;
pub mod storage;
pub mod stt;
pub mod tts;

pub use ai::{AiGateway, HttpAiGateway};
pub use storage::{FsObjectStorage, ObjectStorage};
pub use stt::{HttpSttTokenIssuer, SttTokenIssuer};
pub use tts::{HttpTtsService, TtsService};
