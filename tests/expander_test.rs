use eventpath::compiler::expander::{Expander, Template};
use eventpath::dsl::OrderBy;
use eventpath::runtime::pipeline::{jump_back, JUMP_BACK};
use serde_json::json;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_text_choices_fan_out() {
    let parent = json!({ "next": ["SOSSelectOptionScroll"], "recognition": "TemplateMatch" });
    let template = json!({
        "recognition": { "type": "OCR", "param": { "roi": [300, 200, 700, 400], "expected": "placeholder" } },
        "action": "Click",
        "next": ["SOSSelectOptionConfirm"]
    });

    let expansion = Expander::new().expand_text_choices(
        Template::new("SOSSelectOption", Some(&parent)),
        Template::new("SOSSelectOption_OCR", Some(&template)),
        &strings(&["Foo", "Bar"]),
        OrderBy::Vertical,
        0,
    );

    assert_eq!(expansion.entry, "SOSSelectOption");
    let names: Vec<&str> = expansion.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, vec!["SOSSelectOption", "SOSSelectOption_OCR_0", "SOSSelectOption_OCR_1"]);

    // original edges first, then one JumpBack per choice in expected order
    let parent = expansion.node("SOSSelectOption").unwrap();
    assert_eq!(
        parent.definition,
        json!({ "next": [
            "SOSSelectOptionScroll",
            "[JumpBack]SOSSelectOption_OCR_0",
            "[JumpBack]SOSSelectOption_OCR_1"
        ] })
    );

    let bar = expansion.node("SOSSelectOption_OCR_1").unwrap();
    assert_eq!(bar.definition["action"], "Click");
    assert_eq!(bar.definition["next"], json!(["SOSSelectOptionConfirm"]));
    assert_eq!(
        bar.definition["recognition"],
        json!({
            "type": "OCR",
            "param": {
                "roi": [300, 200, 700, 400],
                "expected": "Bar",
                "order_by": "Vertical",
                "index": 0
            }
        })
    );

    // the template definition itself is untouched
    assert_eq!(template["recognition"]["param"]["expected"], "placeholder");
}

#[test]
fn test_text_choices_expand_shorthand_recognition() {
    let template = json!({ "recognition": "OCR" });

    let expansion = Expander::new().expand_text_choices(
        Template::new("SOSSelectOption", None),
        Template::new("SOSSelectOption_OCR", Some(&template)),
        &strings(&["Only"]),
        OrderBy::Length,
        -1,
    );

    let parent = expansion.node("SOSSelectOption").unwrap();
    assert_eq!(parent.definition, json!({ "next": ["[JumpBack]SOSSelectOption_OCR_0"] }));

    let choice = expansion.node("SOSSelectOption_OCR_0").unwrap();
    assert_eq!(choice.definition["recognition"]["type"], "OCR");
    assert_eq!(choice.definition["recognition"]["param"]["index"], -1);
    assert_eq!(choice.definition["recognition"]["param"]["order_by"], "Length");
}

#[test]
fn test_empty_expected_keeps_parent_edges() {
    let parent = json!({ "next": "SOSSelectOptionScroll" });

    let expansion = Expander::new().expand_text_choices(
        Template::new("SOSSelectOption", Some(&parent)),
        Template::new("SOSSelectOption_OCR", None),
        &[],
        OrderBy::Vertical,
        0,
    );

    assert_eq!(expansion.nodes.len(), 1);
    assert_eq!(expansion.nodes[0].definition, json!({ "next": ["SOSSelectOptionScroll"] }));
}

#[test]
fn test_position_choice() {
    let parent = json!({ "next": ["SOSSelectOptionScroll"] });

    let expansion = Expander::new().expand_position_choice(
        Template::new("SOSSelectOption", Some(&parent)),
        "SOSSelectOption_HSV",
        OrderBy::Horizontal,
        2,
    );

    assert_eq!(expansion.entry, "SOSSelectOption");
    let overrides = expansion.into_override();
    assert_eq!(
        overrides["SOSSelectOption"]["next"],
        json!(["SOSSelectOptionScroll", jump_back("SOSSelectOption_HSV")])
    );
    assert_eq!(
        overrides["SOSSelectOption_HSV"],
        json!({ "recognition": { "param": { "order_by": "Horizontal", "index": 2 } } })
    );
}

#[test]
fn test_encounter_text_single_and_many() {
    let expander = Expander::new();

    let single = expander.expand_encounter_text(
        "SOSSelectEncounterOption_OCR",
        "SOSSelectEncounterOptionRec_Template",
        &strings(&["离开"]),
        OrderBy::Vertical,
    );
    assert_eq!(single.entry, "SOSSelectEncounterOption_OCR");
    assert_eq!(
        single.node("SOSSelectEncounterOption_OCR").unwrap().definition,
        json!({ "custom_action_param": { "expected": "离开" } })
    );
    assert_eq!(
        single.node("SOSSelectEncounterOptionRec_Template").unwrap().definition,
        json!({ "recognition": { "param": { "order_by": "Vertical" } } })
    );

    let many = expander.expand_encounter_text(
        "SOSSelectEncounterOption_OCR",
        "SOSSelectEncounterOptionRec_Template",
        &strings(&["离开", "继续"]),
        OrderBy::Score,
    );
    assert_eq!(
        many.node("SOSSelectEncounterOption_OCR").unwrap().definition["custom_action_param"]["expected"],
        json!(["离开", "继续"])
    );
}

#[test]
fn test_encounter_position() {
    let expansion = Expander::new().expand_encounter_position(
        "SOSSelectEncounterOption_HSV",
        "SOSSelectEncounterOptionRec_Template",
        OrderBy::Vertical,
        1,
    );

    assert_eq!(expansion.entry, "SOSSelectEncounterOption_HSV");
    let overrides = expansion.into_override();
    assert_eq!(overrides.len(), 2);
    assert_eq!(
        overrides["SOSSelectEncounterOption_HSV"],
        json!({ "custom_action_param": { "index": 1 } })
    );
    assert_eq!(
        overrides["SOSSelectEncounterOptionRec_Template"]["recognition"]["param"]["index"],
        1
    );
}

#[test]
fn test_jump_back_prefix() {
    assert_eq!(jump_back("Node"), format!("{}Node", JUMP_BACK));
    assert_eq!(jump_back("Node"), "[JumpBack]Node");
}
