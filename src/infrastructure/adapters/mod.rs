//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod provider;
pub mod storage;

pub use provider::*;
pub use storage::*;
