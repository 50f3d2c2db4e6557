use crate::compiler::interrupts::InterruptResolver;
use crate::dsl::{Action, ActionItem, InterruptSpec, Rect};
use crate::error::{CatalogueError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// 编译后的节点目录 (只读，加载一次)
#[derive(Debug, Clone, Default)]
pub struct Catalogue {
    pub(crate) nodes: HashMap<String, NodeDescriptor>,
    pub(crate) types: Vec<String>,
    pub(crate) return_node: Option<String>,
    pub(crate) terminal_events: Vec<String>,
    pub(crate) resolver: InterruptResolver,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeDescriptor {
    pub body: NodeBody,
    pub event_name_roi: Option<Rect>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Direct(Plan),
    Events(HashMap<String, Plan>),
}

/// Resolved actions plus concrete interrupt identifiers for one node cycle.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Plan {
    pub actions: Vec<ActionItem>,
    pub interrupts: Vec<String>,
}

impl Catalogue {
    pub fn lookup(&self, node_type: &str) -> Result<&NodeDescriptor> {
        self.nodes
            .get(node_type)
            .ok_or_else(|| CatalogueError::UnknownNodeType(node_type.to_string()))
    }

    /// Actions and interrupts for `node_type` / `event_name`.
    ///
    /// The return-to-selection `RunNode` is appended unless the event is terminal.
    pub fn resolve_actions(&self, node_type: &str, event_name: &str) -> Result<Plan> {
        let descriptor = self.lookup(node_type)?;

        let (plan, terminal) = match &descriptor.body {
            NodeBody::Direct(plan) => (plan, false),
            NodeBody::Events(events) => {
                let plan = events.get(event_name).ok_or_else(|| CatalogueError::UnadaptedEvent {
                    node_type: node_type.to_string(),
                    event: event_name.to_string(),
                })?;
                (plan, self.terminal_events.iter().any(|e| e == event_name))
            }
        };

        let mut plan = plan.clone();
        if !terminal {
            if let Some(name) = &self.return_node {
                plan.actions.push(ActionItem::Action(Action::RunNode { name: name.clone() }));
            }
        }
        Ok(plan)
    }

    /// Resolve an ad-hoc interrupt spec against this catalogue's `common_interrupts`.
    pub fn resolve_interrupts(&self, spec: &InterruptSpec) -> Vec<String> {
        self.resolver.resolve(spec)
    }

    /// 检测类别 -> 节点类型
    pub fn node_type_for_class(&self, cls_index: usize) -> Result<&str> {
        self.types
            .get(cls_index)
            .map(String::as_str)
            .ok_or(CatalogueError::UnknownClass(cls_index))
    }

    pub fn event_name_roi(&self, node_type: &str) -> Result<Option<Rect>> {
        Ok(self.lookup(node_type)?.event_name_roi.filter(|roi| !roi.is_empty()))
    }

    pub fn node_types(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn event_count(&self) -> usize {
        self.nodes
            .values()
            .map(|d| match &d.body {
                NodeBody::Direct(_) => 0,
                NodeBody::Events(events) => events.len(),
            })
            .sum()
    }
}
