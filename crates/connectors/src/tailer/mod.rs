pub mod sled_tailer;

pub use sled_tailer::SledTailer;
