//! Application Services - 服务商调用封装

mod synthesis;
mod voice_cloning;

pub use synthesis::{SynthesisClient, SynthesisProfile, MIN_OUTPUT_BYTES};
pub use voice_cloning::VoiceCloningClient;
