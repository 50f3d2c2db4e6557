use anyhow::{Result, Context as AnyhowContext};
use std::fs;
use std::path::Path;
use crate::dsl::NodeDocument;

/// 按扩展名加载节点文档：`.yaml`/`.yml` 走 YAML，其余按 JSON 处理
pub fn load_document(file_path: impl AsRef<Path>) -> Result<NodeDocument> {
    let file_path = file_path.as_ref();
    let content = fs::read_to_string(file_path)
        .with_context(|| format!("Failed to read node document from {}", file_path.display()))?;

    let is_yaml = matches!(
        file_path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );

    if is_yaml {
        parse_yaml(&content)
            .with_context(|| format!("Failed to deserialize YAML content from {}", file_path.display()))
    } else {
        parse_json(&content)
            .with_context(|| format!("Failed to deserialize JSON content from {}", file_path.display()))
    }
}

pub fn parse_json(content: &str) -> Result<NodeDocument> {
    Ok(serde_json::from_str(content)?)
}

pub fn parse_yaml(content: &str) -> Result<NodeDocument> {
    Ok(serde_yaml::from_str(content)?)
}
