use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// 任务引擎中 "识别失败后回到父节点" 的 next 前缀
pub const JUMP_BACK: &str = "[JumpBack]";

/// 覆盖到任务引擎图上的节点片段 (node name -> partial definition)
pub type PipelineOverride = BTreeMap<String, Value>;

/// 临时生成的具体节点
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConcreteNode {
    pub name: String,
    /// 节点定义 (可能只是需要覆盖的部分字段)
    pub definition: Value,
}

/// An expanded graph fragment: the node to run plus every node it needs overridden.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Expansion {
    pub entry: String,
    pub nodes: Vec<ConcreteNode>,
}

impl Expansion {
    pub fn node(&self, name: &str) -> Option<&ConcreteNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    pub fn into_override(self) -> PipelineOverride {
        self.nodes
            .into_iter()
            .map(|node| (node.name, node.definition))
            .collect()
    }
}

pub fn jump_back(name: &str) -> String {
    format!("{}{}", JUMP_BACK, name)
}
