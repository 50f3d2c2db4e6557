use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level interpreter configuration.
///
/// Every section is optional; the defaults reproduce the built-in profile
/// of the Silence event route.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub interpreter: InterpreterSettings,
    #[serde(default)]
    pub catalogue: CatalogueSettings,
    #[serde(default)]
    pub selection: SelectionSettings,
    #[serde(default)]
    pub selector: SelectorSettings,
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        let settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to deserialize settings from {}", path.display()))?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InterpreterSettings {
    /// 连续无中断触发的最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// 偶遇选项预检查前的等待
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// 每个会话最多执行一次的 RunNode
    #[serde(default = "default_run_once")]
    pub run_once: Vec<String>,
}

impl InterpreterSettings {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for InterpreterSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            settle_ms: default_settle_ms(),
            run_once: default_run_once(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogueSettings {
    /// Appended to every resolved action list to return to node selection.
    #[serde(default = "default_return_node")]
    pub return_node: Option<String>,
    #[serde(default = "default_terminal_events")]
    pub terminal_events: Vec<String>,
}

impl Default for CatalogueSettings {
    fn default() -> Self {
        Self {
            return_node: default_return_node(),
            terminal_events: default_terminal_events(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionSettings {
    pub option_screen: String,
    pub option_text_template: String,
    pub option_position_node: String,
    pub encounter_screen: String,
    pub encounter_text_node: String,
    pub encounter_position_node: String,
}

impl Default for SelectionSettings {
    fn default() -> Self {
        Self {
            option_screen: "SOSSelectOption".to_string(),
            option_text_template: "SOSSelectOption_OCR".to_string(),
            option_position_node: "SOSSelectOption_HSV".to_string(),
            encounter_screen: "SOSSelectEncounterOptionRec_Template".to_string(),
            encounter_text_node: "SOSSelectEncounterOption_OCR".to_string(),
            encounter_position_node: "SOSSelectEncounterOption_HSV".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectorSettings {
    pub click_task: String,
    pub click_attempts: usize,
    pub confirm_node: String,
    pub event_reco: String,
    pub event_attempts: usize,
    /// 读取事件名失败时检查的弹窗
    pub event_popups: Vec<String>,
    pub fallback_screen: String,
    pub fallback_node_type: String,
}

impl Default for SelectorSettings {
    fn default() -> Self {
        Self {
            click_task: "Click".to_string(),
            click_attempts: 3,
            confirm_node: "SOSGOTO".to_string(),
            event_reco: "SOSEventRec".to_string(),
            event_attempts: 3,
            event_popups: [
                "SOSWarning",
                "SOSStatsUpButton",
                "SOSStatsUp",
                "SOSArtefactsObtained",
                "SOSSelectArtefact",
                "SOSLoseArtefact",
                "SOSStrengthenArtefact",
                "SOSHarmonicObtained",
                "SOSSelectHarmonic",
                "SOSResonatorObtained",
                "SOSSelectResonator",
                "CloseTip",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            fallback_screen: "SOSShopping".to_string(),
            fallback_node_type: "购物契机".to_string(),
        }
    }
}

fn default_max_retries() -> usize {
    20
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_run_once() -> Vec<String> {
    vec!["SOSTeamSelect".to_string()]
}

fn default_return_node() -> Option<String> {
    Some("FlagInSOSMain".to_string())
}

fn default_terminal_events() -> Vec<String> {
    vec!["最终难题".to_string()]
}
