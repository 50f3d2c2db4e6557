pub mod catalogue;
pub mod context;
pub mod engine;
pub mod pipeline;
pub mod selector;
pub mod storage;
pub mod task;
pub mod vision;
