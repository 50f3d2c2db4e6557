pub mod builder;

use std::collections::HashMap;
use serde::de::{self, Deserializer};
use serde::{Serialize, Deserialize};

/// 原始节点描述文档 (nodes.json)
/// 顶层键为节点类型名，另有 `common_interrupts` 与 `types` 两个保留键
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeDocument {
    #[serde(default)]
    pub common_interrupts: HashMap<String, InterruptSpec>,
    /// 检测模型 cls_index -> 节点类型名
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(flatten)]
    pub nodes: HashMap<String, NodeEntry>,
}

/// 单个节点类型：要么 `actions`，要么 `events`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NodeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupts: Option<InterruptSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<HashMap<String, EventEntry>>,
    /// 事件标题所在区域；为空表示该节点没有事件名
    #[serde(
        default,
        deserialize_with = "deserialize_roi",
        skip_serializing_if = "Option::is_none"
    )]
    pub event_name_roi: Option<Rect>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventEntry {
    #[serde(default)]
    pub actions: Vec<ActionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupts: Option<InterruptSpec>,
}

/// interrupts 字段：字面量列表，或 `@a+@b+Literal` 形式的表达式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum InterruptSpec {
    List(Vec<String>),
    Expr(String),
}

impl Default for InterruptSpec {
    fn default() -> Self {
        InterruptSpec::List(Vec::new())
    }
}

/// actions 列表中的一项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ActionItem {
    /// 裸字符串：按中断节点处理 (识别命中后执行)
    Interrupt(String),
    /// 有序候选，第一个成功者胜出
    AnyOf(Vec<ActionItem>),
    Action(Action),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Action {
    RunNode {
        name: String,
    },
    SelectOption {
        method: SelectMethod,
        #[serde(default)]
        expected: Expected,
        #[serde(default)]
        order_by: OrderBy,
        #[serde(default)]
        index: i64,
    },
    SelectEncounterOption {
        method: SelectMethod,
        #[serde(default)]
        expected: Expected,
        #[serde(default)]
        order_by: OrderBy,
        #[serde(default)]
        index: i64,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SelectMethod {
    #[serde(rename = "OCR")]
    Ocr,
    #[serde(rename = "HSV")]
    Hsv,
}

/// expected 可以是单个字符串或字符串列表
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Expected {
    One(String),
    Many(Vec<String>),
}

impl Default for Expected {
    fn default() -> Self {
        Expected::One(String::new())
    }
}

impl Expected {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Expected::One(s) => vec![s.clone()],
            Expected::Many(v) => v.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderBy {
    Horizontal,
    #[default]
    Vertical,
    Score,
    Area,
    Length,
    Random,
    Expected,
}

/// [x, y, w, h]
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "[i32; 4]", into = "[i32; 4]")]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl From<[i32; 4]> for Rect {
    fn from([x, y, w, h]: [i32; 4]) -> Self {
        Self { x, y, w, h }
    }
}

impl From<Rect> for [i32; 4] {
    fn from(r: Rect) -> Self {
        [r.x, r.y, r.w, r.h]
    }
}

impl Rect {
    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }
}

/// `null` 与 `[]` 都表示没有事件名区域
fn deserialize_roi<'de, D>(deserializer: D) -> Result<Option<Rect>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<i32>> = Option::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some([]) => Ok(None),
        Some(&[x, y, w, h]) => Ok(Some(Rect { x, y, w, h })),
        Some(other) => Err(de::Error::invalid_length(
            other.len(),
            &"an empty array or [x, y, w, h]",
        )),
    }
}
