use crate::runtime::pipeline::PipelineOverride;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Succeeded,
    Failed,
}

/// 任务引擎：执行点击/滑动等实际交互
#[async_trait]
pub trait TaskEngine: Send + Sync {
    /// Run `entry` with `overrides` merged into the engine's graph for this call only.
    async fn run(&self, entry: &str, overrides: &PipelineOverride) -> Result<TaskStatus>;

    /// 读取任务引擎中某节点的原始定义 (用于复制模板)
    fn node_data(&self, name: &str) -> Option<Value>;
}
