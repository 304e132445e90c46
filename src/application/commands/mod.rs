//! Commands - 写操作命令定义

pub mod handlers;
mod synthesize_commands;

pub use synthesize_commands::{PersistReference, Synthesize, SynthesizeResponse};
