use thiserror::Error;

/// 目录数据错误 (配置/数据层面，不参与重试)
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogueError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Unadapted event '{event}' for node type '{node_type}'")]
    UnadaptedEvent { node_type: String, event: String },

    #[error("Malformed node '{node_type}': {reason}")]
    MalformedNode { node_type: String, reason: String },

    #[error("Interrupt reference cycle: {}", .0.join(" -> "))]
    InterruptCycle(Vec<String>),

    #[error("Detection class index {0} is not in the types table")]
    UnknownClass(usize),
}

impl CatalogueError {
    /// Errors that must halt the whole automation session.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CatalogueError::UnknownNodeType(_) | CatalogueError::UnadaptedEvent { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CatalogueError>;
