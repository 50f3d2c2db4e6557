use crate::compiler::interrupts::InterruptResolver;
use crate::config::CatalogueSettings;
use crate::dsl::{EventEntry, NodeDocument, NodeEntry};
use crate::error::{CatalogueError, Result};
use crate::runtime::catalogue::{Catalogue, NodeBody, NodeDescriptor, Plan};
use std::collections::HashMap;
use tracing::{debug, warn};

pub struct Compiler {
    settings: CatalogueSettings,
}

impl Compiler {
    pub fn new(settings: CatalogueSettings) -> Self {
        Self { settings }
    }

    pub fn compile(&self, document: NodeDocument) -> Result<Catalogue> {
        // 1. Pass 1: common interrupts (解析 + 环检测 + 缓存)
        let resolver = InterruptResolver::new(&document.common_interrupts)?;

        // 2. Pass 2: Transform
        let mut nodes = HashMap::with_capacity(document.nodes.len());
        for (node_type, entry) in document.nodes {
            let descriptor = self.transform_node(&node_type, entry, &resolver)?;
            nodes.insert(node_type, descriptor);
        }

        debug!(nodes = nodes.len(), types = document.types.len(), "Catalogue compiled");

        Ok(Catalogue {
            nodes,
            types: document.types,
            return_node: self.settings.return_node.clone(),
            terminal_events: self.settings.terminal_events.clone(),
            resolver,
        })
    }

    fn transform_node(
        &self,
        node_type: &str,
        entry: NodeEntry,
        resolver: &InterruptResolver,
    ) -> Result<NodeDescriptor> {
        let body = match (entry.actions, entry.events) {
            (Some(actions), None) => NodeBody::Direct(Plan {
                actions,
                interrupts: entry
                    .interrupts
                    .map(|spec| resolver.resolve(&spec))
                    .unwrap_or_default(),
            }),
            (None, Some(events)) => {
                if entry.interrupts.is_some() {
                    warn!(node_type = %node_type, "Node-level interrupts ignored on an event node");
                }
                NodeBody::Events(
                    events
                        .into_iter()
                        .map(|(name, event)| (name, transform_event(event, resolver)))
                        .collect(),
                )
            }
            (Some(_), Some(_)) => return Err(malformed(node_type, "both actions and events")),
            (None, None) => return Err(malformed(node_type, "neither actions nor events")),
        };

        Ok(NodeDescriptor {
            body,
            event_name_roi: entry.event_name_roi,
        })
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CatalogueSettings::default())
    }
}

fn transform_event(event: EventEntry, resolver: &InterruptResolver) -> Plan {
    Plan {
        actions: event.actions,
        interrupts: event
            .interrupts
            .map(|spec| resolver.resolve(&spec))
            .unwrap_or_default(),
    }
}

fn malformed(node_type: &str, reason: &str) -> CatalogueError {
    CatalogueError::MalformedNode {
        node_type: node_type.to_string(),
        reason: reason.to_string(),
    }
}
