use std::sync::Arc;
use std::time::Duration;
use serde_json::json;
use tracing::{debug, error, info, warn};
use crate::config::{SelectorSettings, Settings};
use crate::dsl::Rect;
use crate::error::Result;
use crate::runtime::catalogue::Catalogue;
use crate::runtime::context::Session;
use crate::runtime::engine::log_recognition_error;
use crate::runtime::pipeline::PipelineOverride;
use crate::runtime::task::TaskEngine;
use crate::runtime::vision::{Recognition, Vision};

/// 节点检测结果：类别索引 + 位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub cls_index: usize,
    pub target: Rect,
}

/// 节点选择：进入被检测到的节点，并读取事件名写入会话
pub struct NodeSelector {
    catalogue: Arc<Catalogue>,
    vision: Arc<dyn Vision>,
    tasks: Arc<dyn TaskEngine>,
    settings: SelectorSettings,
    backoff: Duration,
}

impl NodeSelector {
    pub fn new(
        catalogue: Arc<Catalogue>,
        vision: Arc<dyn Vision>,
        tasks: Arc<dyn TaskEngine>,
        settings: &Settings,
    ) -> Self {
        Self {
            catalogue,
            vision,
            tasks,
            settings: settings.selector.clone(),
            backoff: settings.interpreter.backoff(),
        }
    }

    /// Returns `Ok(false)` when the node could not be entered or its event read.
    ///
    /// Fatal catalogue errors cancel the session before they are returned.
    pub async fn select(&self, session: &Session, detection: Detection) -> Result<bool> {
        let result = self.enter_and_read(session, detection).await;
        if let Err(e) = &result {
            error!(session = %session.id, error = %e, "Cannot select node");
            if e.is_fatal() {
                session.cancel();
            }
        }
        result
    }

    async fn enter_and_read(&self, session: &Session, detection: Detection) -> Result<bool> {
        let node_type = self.catalogue.node_type_for_class(detection.cls_index)?.to_string();
        if node_type.is_empty() {
            error!(cls_index = detection.cls_index, "Empty node type for detection class");
            return Ok(false);
        }
        let roi = self.catalogue.event_name_roi(&node_type)?;

        session.set_node(&node_type, "");
        info!(node_type = %node_type, "Entering node");

        self.enter(session, detection.target).await;
        if session.is_cancelled() {
            return Ok(false);
        }

        let Some(roi) = roi else {
            return Ok(true);
        };

        if let Some(event) = self.read_event_name(session, roi).await {
            info!(node_type = %node_type, event = %event, "Current event");
            session.set_event_name(&event);
            return Ok(true);
        }
        if session.is_cancelled() {
            return Ok(false);
        }

        // 事件名读取失败：可能是购物界面被误识别为其他节点
        if self.fallback_present().await {
            warn!(
                node_type = %node_type,
                fallback = %self.settings.fallback_node_type,
                "Event name unreadable but fallback screen detected, correcting node type"
            );
            session.set_node(&self.settings.fallback_node_type, "");
            return Ok(true);
        }

        session.set_event_name("");
        Ok(false)
    }

    async fn enter(&self, session: &Session, target: Rect) {
        let click = PipelineOverride::from([(
            self.settings.click_task.clone(),
            json!({ "action": "Click", "target": target }),
        )]);

        for _ in 0..self.settings.click_attempts {
            if session.is_cancelled() {
                return;
            }

            if let Err(e) = self.tasks.run(&self.settings.click_task, &click).await {
                warn!(error = %e, "Click on node failed");
            }

            let frame = match self.vision.capture().await {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "Capture failed");
                    continue;
                }
            };

            let confirm = &self.settings.confirm_node;
            if self.vision.recognize(confirm, &frame, None).await.is_hit() {
                if let Err(e) = self.tasks.run(confirm, &PipelineOverride::new()).await {
                    warn!(task = %confirm, error = %e, "Confirm task failed");
                }
                return;
            }
        }
    }

    async fn read_event_name(&self, session: &Session, roi: Rect) -> Option<String> {
        let reco = &self.settings.event_reco;
        let roi_override = PipelineOverride::from([(reco.clone(), json!({ "roi": roi }))]);

        let mut retries = 0;
        while retries < self.settings.event_attempts {
            if session.is_cancelled() {
                return None;
            }

            let frame = match self.vision.capture().await {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(error = %e, "Capture failed");
                    tokio::time::sleep(self.backoff).await;
                    retries += 1;
                    continue;
                }
            };

            let recognition = self.vision.recognize(reco, &frame, Some(&roi_override)).await;
            log_recognition_error(reco, &recognition);
            if let Recognition::Hit(detail) = recognition {
                return Some(detail.text.unwrap_or_default());
            }

            let mut handled = false;
            for popup in &self.settings.event_popups {
                if session.is_cancelled() {
                    return None;
                }
                if self.vision.recognize(popup, &frame, None).await.is_hit() {
                    debug!(popup = %popup, "Popup detected, executing");
                    if let Err(e) = self.tasks.run(popup, &PipelineOverride::new()).await {
                        warn!(task = %popup, error = %e, "Popup task failed");
                    }
                    handled = true;
                    break;
                }
            }

            if handled {
                retries = 0;
            } else {
                tokio::time::sleep(self.backoff).await;
                retries += 1;
            }
        }
        None
    }

    async fn fallback_present(&self) -> bool {
        match self.vision.capture().await {
            Ok(frame) => self
                .vision
                .recognize(&self.settings.fallback_screen, &frame, None)
                .await
                .is_hit(),
            Err(e) => {
                warn!(error = %e, "Capture failed");
                false
            }
        }
    }
}
