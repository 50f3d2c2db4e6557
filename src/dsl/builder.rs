use crate::dsl::{
    Action, ActionItem, EventEntry, Expected, InterruptSpec, NodeDocument, NodeEntry, OrderBy,
    Rect, SelectMethod,
};
use std::collections::HashMap;

pub struct DocumentBuilder {
    common_interrupts: HashMap<String, InterruptSpec>,
    types: Vec<String>,
    pub nodes: HashMap<String, NodeEntry>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self {
            common_interrupts: HashMap::new(),
            types: Vec::new(),
            nodes: HashMap::new(),
        }
    }

    pub fn common(mut self, name: &str, spec: impl Into<InterruptSpec>) -> Self {
        self.common_interrupts.insert(name.to_string(), spec.into());
        self
    }

    pub fn types(mut self, types: &[&str]) -> Self {
        self.types = types.iter().map(|s| s.to_string()).collect();
        self
    }

    /// 平铺节点：actions + interrupts
    pub fn node(self, node_type: &str) -> NodeBuilder {
        NodeBuilder {
            document_builder: self,
            node_type: node_type.to_string(),
            actions: Vec::new(),
            interrupts: None,
            event_name_roi: None,
        }
    }

    /// 带事件的节点
    pub fn event_node(self, node_type: &str) -> EventNodeBuilder {
        EventNodeBuilder {
            document_builder: self,
            node_type: node_type.to_string(),
            events: HashMap::new(),
            event_name_roi: None,
        }
    }

    pub fn build(self) -> NodeDocument {
        NodeDocument {
            common_interrupts: self.common_interrupts,
            types: self.types,
            nodes: self.nodes,
        }
    }
}

impl Default for DocumentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct NodeBuilder {
    document_builder: DocumentBuilder,
    node_type: String,
    actions: Vec<ActionItem>,
    interrupts: Option<InterruptSpec>,
    event_name_roi: Option<Rect>,
}

impl NodeBuilder {
    pub fn action(mut self, item: impl Into<ActionItem>) -> Self {
        self.actions.push(item.into());
        self
    }

    pub fn interrupts(mut self, spec: impl Into<InterruptSpec>) -> Self {
        self.interrupts = Some(spec.into());
        self
    }

    pub fn event_name_roi(mut self, roi: [i32; 4]) -> Self {
        self.event_name_roi = Some(roi.into());
        self
    }

    pub fn build(mut self) -> DocumentBuilder {
        self.document_builder.nodes.insert(self.node_type, NodeEntry {
            actions: Some(self.actions),
            interrupts: self.interrupts,
            events: None,
            event_name_roi: self.event_name_roi,
        });
        self.document_builder
    }
}

pub struct EventNodeBuilder {
    document_builder: DocumentBuilder,
    node_type: String,
    events: HashMap<String, EventEntry>,
    event_name_roi: Option<Rect>,
}

impl EventNodeBuilder {
    pub fn event(
        mut self,
        name: &str,
        actions: Vec<ActionItem>,
        interrupts: impl Into<InterruptSpec>,
    ) -> Self {
        self.events.insert(name.to_string(), EventEntry {
            actions,
            interrupts: Some(interrupts.into()),
        });
        self
    }

    pub fn event_name_roi(mut self, roi: [i32; 4]) -> Self {
        self.event_name_roi = Some(roi.into());
        self
    }

    pub fn build(mut self) -> DocumentBuilder {
        self.document_builder.nodes.insert(self.node_type, NodeEntry {
            actions: None,
            interrupts: None,
            events: Some(self.events),
            event_name_roi: self.event_name_roi,
        });
        self.document_builder
    }
}

// --- 便捷构造 ---

impl From<&str> for InterruptSpec {
    fn from(expr: &str) -> Self {
        InterruptSpec::Expr(expr.to_string())
    }
}

impl From<Vec<&str>> for InterruptSpec {
    fn from(list: Vec<&str>) -> Self {
        InterruptSpec::List(list.into_iter().map(|s| s.to_string()).collect())
    }
}

impl From<&str> for ActionItem {
    fn from(name: &str) -> Self {
        ActionItem::Interrupt(name.to_string())
    }
}

impl From<Action> for ActionItem {
    fn from(action: Action) -> Self {
        ActionItem::Action(action)
    }
}

impl From<Vec<ActionItem>> for ActionItem {
    fn from(items: Vec<ActionItem>) -> Self {
        ActionItem::AnyOf(items)
    }
}

impl Action {
    pub fn run_node(name: &str) -> Self {
        Action::RunNode { name: name.to_string() }
    }

    pub fn select_text(expected: &[&str], order_by: OrderBy, index: i64) -> Self {
        Action::SelectOption {
            method: SelectMethod::Ocr,
            expected: Expected::Many(expected.iter().map(|s| s.to_string()).collect()),
            order_by,
            index,
        }
    }

    pub fn select_position(order_by: OrderBy, index: i64) -> Self {
        Action::SelectOption {
            method: SelectMethod::Hsv,
            expected: Expected::default(),
            order_by,
            index,
        }
    }
}
