//! Provider Adapter - 语音服务商实现

mod elevenlabs_client;
mod fake_provider;

pub use elevenlabs_client::{ElevenLabsClient, ElevenLabsClientConfig};
pub use fake_provider::{CreatedVoice, FakeVoiceProvider};
