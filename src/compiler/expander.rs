use crate::dsl::OrderBy;
use crate::runtime::pipeline::{jump_back, ConcreteNode, Expansion};
use serde_json::{json, Map, Value};

/// 模板节点：名称 + 任务引擎中的原始定义 (可能不存在)
#[derive(Debug, Clone, Copy)]
pub struct Template<'a> {
    pub name: &'a str,
    pub definition: Option<&'a Value>,
}

impl<'a> Template<'a> {
    pub fn new(name: &'a str, definition: Option<&'a Value>) -> Self {
        Self { name, definition }
    }
}

/// 选项选择的动态展开
/// 不修改共享图，只返回需要覆盖的节点片段
pub struct Expander {
    // 可以添加状态，如命名规则
}

impl Expander {
    pub fn new() -> Self {
        Self {}
    }

    /// Text selection: one ephemeral copy of `template` per expected string.
    ///
    /// The parent keeps its own `next` list and gains a `[JumpBack]` edge to every
    /// copy in `expected` order, so each candidate is tried in turn and a miss
    /// returns control to the parent.
    pub fn expand_text_choices(
        &self,
        parent: Template<'_>,
        template: Template<'_>,
        expected: &[String],
        order_by: OrderBy,
        index: i64,
    ) -> Expansion {
        let mut next = parent_next(parent.definition);
        let mut choices = Vec::with_capacity(expected.len());

        for (i, text) in expected.iter().enumerate() {
            let name = format!("{}_{}", template.name, i);

            let mut definition = template.definition.cloned().unwrap_or_else(|| json!({}));
            set_recognition_params(&mut definition, json!({
                "expected": text,
                "order_by": order_by,
                "index": index,
            }));

            next.push(jump_back(&name).into());
            choices.push(ConcreteNode { name, definition });
        }

        let mut nodes = Vec::with_capacity(choices.len() + 1);
        nodes.push(ConcreteNode {
            name: parent.name.to_string(),
            definition: json!({ "next": next }),
        });
        nodes.extend(choices);

        Expansion {
            entry: parent.name.to_string(),
            nodes,
        }
    }

    /// Positional selection: a single node parametrized with ordering and index.
    pub fn expand_position_choice(
        &self,
        parent: Template<'_>,
        target: &str,
        order_by: OrderBy,
        index: i64,
    ) -> Expansion {
        let mut next = parent_next(parent.definition);
        next.push(jump_back(target).into());

        Expansion {
            entry: parent.name.to_string(),
            nodes: vec![
                ConcreteNode {
                    name: parent.name.to_string(),
                    definition: json!({ "next": next }),
                },
                ConcreteNode {
                    name: target.to_string(),
                    definition: recognition_override(json!({
                        "order_by": order_by,
                        "index": index,
                    })),
                },
            ],
        }
    }

    pub fn expand_encounter_text(
        &self,
        entry: &str,
        screen: &str,
        expected: &[String],
        order_by: OrderBy,
    ) -> Expansion {
        let expected = match expected {
            [single] => json!(single),
            many => json!(many),
        };

        Expansion {
            entry: entry.to_string(),
            nodes: vec![
                ConcreteNode {
                    name: entry.to_string(),
                    definition: json!({ "custom_action_param": { "expected": expected } }),
                },
                ConcreteNode {
                    name: screen.to_string(),
                    definition: recognition_override(json!({ "order_by": order_by })),
                },
            ],
        }
    }

    pub fn expand_encounter_position(
        &self,
        entry: &str,
        screen: &str,
        order_by: OrderBy,
        index: i64,
    ) -> Expansion {
        Expansion {
            entry: entry.to_string(),
            nodes: vec![
                ConcreteNode {
                    name: entry.to_string(),
                    definition: json!({ "custom_action_param": { "index": index } }),
                },
                ConcreteNode {
                    name: screen.to_string(),
                    definition: recognition_override(json!({
                        "order_by": order_by,
                        "index": index,
                    })),
                },
            ],
        }
    }
}

impl Default for Expander {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_next(definition: Option<&Value>) -> Vec<Value> {
    match definition.and_then(|d| d.get("next")) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => vec![Value::String(s.clone())],
        _ => Vec::new(),
    }
}

fn recognition_override(param: Value) -> Value {
    json!({ "recognition": { "param": param } })
}

/// 写入 recognition.param；`"recognition": "OCR"` 这种简写会被展开为对象
fn set_recognition_params(definition: &mut Value, params: Value) {
    if !definition.is_object() {
        *definition = json!({});
    }
    let Some(node) = definition.as_object_mut() else { return };

    let recognition = node
        .entry("recognition")
        .or_insert_with(|| json!({}));
    if let Some(kind) = recognition.as_str().map(str::to_string) {
        *recognition = json!({ "type": kind });
    }
    if !recognition.is_object() {
        *recognition = json!({});
    }
    let Some(recognition) = recognition.as_object_mut() else { return };

    let param = recognition
        .entry("param")
        .or_insert_with(|| Value::Object(Map::new()));
    if !param.is_object() {
        *param = Value::Object(Map::new());
    }
    if let (Some(param), Value::Object(params)) = (param.as_object_mut(), params) {
        param.extend(params);
    }
}
