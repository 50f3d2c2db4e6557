use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::config::{InterpreterSettings, SelectionSettings, Settings};
use crate::dsl::{Action, ActionItem, SelectMethod};
use crate::error::Result;
use crate::nodes::select::OptionSelector;
use crate::runtime::catalogue::{Catalogue, Plan};
use crate::runtime::context::Session;
use crate::runtime::pipeline::PipelineOverride;
use crate::runtime::task::TaskEngine;
use crate::runtime::vision::{Frame, Recognition, Vision};

/// 动作列表 / 单个动作的最终结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// 重试耗尽 (AttemptExhausted)，由调用方决定是否继续
    Failure,
    Cancelled,
}

/// 单次尝试 (try_action) 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Hit,
    Miss,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptReport {
    pub outcome: Outcome,
    /// Passes through the loop body, including those after a reset.
    pub iterations: usize,
    pub interrupts_fired: usize,
}

type ProbeFuture<'a> = Pin<Box<dyn Future<Output = Probe> + Send + 'a>>;

/// Interrupt-aware action interpreter.
///
/// Runs a node's action list strictly in order. Each action gets an attempt loop
/// bounded by `max_retries` consecutive iterations in which no interrupt fired;
/// an interrupt that fires resets the budget.
pub struct Interpreter {
    catalogue: Arc<Catalogue>,
    vision: Arc<dyn Vision>,
    tasks: Arc<dyn TaskEngine>,
    settings: InterpreterSettings,
    selection: SelectionSettings,
}

impl Interpreter {
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
            settings: settings.interpreter.clone(),
            selection: settings.selection.clone(),
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    /// 处理会话当前所在的节点
    ///
    /// Configuration errors are returned and, when fatal, cancel the session.
    pub async fn run_node(&self, session: &Session) -> Result<Outcome> {
        let cursor = session.cursor();

        let plan = match self.catalogue.resolve_actions(&cursor.node_type, &cursor.event_name) {
            Ok(plan) => plan,
            Err(e) => {
                error!(session = %session.id, error = %e, "Cannot resolve node actions");
                if e.is_fatal() {
                    session.cancel();
                }
                return Err(e);
            }
        };

        info!(
            node_type = %cursor.node_type,
            event = %cursor.event_name,
            actions = plan.actions.len(),
            interrupts = plan.interrupts.len(),
            "Processing node"
        );

        Ok(self.run_plan(session, &plan).await)
    }

    pub async fn run_plan(&self, session: &Session, plan: &Plan) -> Outcome {
        for item in &plan.actions {
            if session.is_cancelled() {
                debug!("Stop requested, skipping remaining actions");
                return Outcome::Cancelled;
            }

            let report = self.attempt(session, item, &plan.interrupts).await;
            if report.outcome != Outcome::Success {
                return report.outcome;
            }
        }
        Outcome::Success
    }

    /// The attempt loop for a single action-list item.
    pub async fn attempt(
        &self,
        session: &Session,
        item: &ActionItem,
        interrupts: &[String],
    ) -> AttemptReport {
        let mut report = AttemptReport {
            outcome: Outcome::Failure,
            iterations: 0,
            interrupts_fired: 0,
        };
        let mut retries = 0;

        while retries < self.settings.max_retries {
            if session.is_cancelled() {
                debug!("Stop requested, abandoning action");
                report.outcome = Outcome::Cancelled;
                return report;
            }
            report.iterations += 1;

            match self.try_action(session, item, None).await {
                Probe::Hit => {
                    report.outcome = Outcome::Success;
                    return report;
                }
                Probe::Cancelled => {
                    report.outcome = Outcome::Cancelled;
                    return report;
                }
                Probe::Miss => {}
            }

            for interrupt in interrupts {
                if session.is_cancelled() {
                    debug!("Stop requested, abandoning action");
                    report.outcome = Outcome::Cancelled;
                    return report;
                }

                let frame = match self.vision.capture().await {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!(interrupt = %interrupt, error = %e, "Capture failed, probe skipped");
                        continue;
                    }
                };

                if self.probe_interrupt(interrupt, Some(&frame)).await == Probe::Hit {
                    retries = 0;
                    report.interrupts_fired += 1;
                    break;
                }
            }

            tokio::time::sleep(self.settings.backoff()).await;
            retries += 1;
        }

        if session.is_cancelled() {
            debug!("Stop requested during the last attempt");
            report.outcome = Outcome::Cancelled;
            return report;
        }

        warn!(iterations = report.iterations, "Action attempts exhausted");
        report
    }

    /// 执行一次动作，不重试
    pub fn try_action<'a>(
        &'a self,
        session: &'a Session,
        item: &'a ActionItem,
        frame: Option<&'a Frame>,
    ) -> ProbeFuture<'a> {
        Box::pin(async move {
            match item {
                ActionItem::Interrupt(name) => self.probe_interrupt(name, frame).await,
                ActionItem::AnyOf(items) => {
                    for sub in items {
                        if session.is_cancelled() {
                            return Probe::Cancelled;
                        }
                        match self.try_action(session, sub, None).await {
                            Probe::Miss => continue,
                            other => return other,
                        }
                    }
                    Probe::Miss
                }
                ActionItem::Action(action) => self.run_action(session, action).await,
            }
        })
    }

    async fn run_action(&self, session: &Session, action: &Action) -> Probe {
        match action {
            Action::RunNode { name } => self.run_named_node(session, name).await,
            Action::SelectOption { method, expected, order_by, index } => {
                let selector = self.option_selector();
                match method {
                    SelectMethod::Ocr => {
                        selector.select_by_text(session, &expected.to_vec(), *order_by, *index).await
                    }
                    SelectMethod::Hsv => selector.select_by_position(session, *order_by, *index).await,
                }
            }
            Action::SelectEncounterOption { method, expected, order_by, index } => {
                let selector = self.option_selector();
                match method {
                    SelectMethod::Ocr => {
                        selector
                            .select_encounter_by_text(session, &expected.to_vec(), *order_by)
                            .await
                    }
                    SelectMethod::Hsv => {
                        selector.select_encounter_by_position(session, *order_by, *index).await
                    }
                }
            }
        }
    }

    async fn run_named_node(&self, session: &Session, name: &str) -> Probe {
        if session.is_cancelled() {
            return Probe::Cancelled;
        }

        if session.run_once.should_skip(name) {
            debug!(node = %name, "Run-once node already executed, skipping");
            return Probe::Hit;
        }

        let frame = match self.vision.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(node = %name, error = %e, "Capture failed");
                return Probe::Miss;
            }
        };

        let recognition = self.vision.recognize(name, &frame, None).await;
        log_recognition_error(name, &recognition);
        if !recognition.accepts() {
            return Probe::Miss;
        }

        debug!(node = %name, "Executing node");
        if !self.run_task(name, &PipelineOverride::new()).await {
            return Probe::Miss;
        }

        if let Some(count) = session.run_once.record(name) {
            debug!(node = %name, count, "Run-once node recorded");
        }
        Probe::Hit
    }

    /// 中断节点：识别命中后执行同名任务
    async fn probe_interrupt(&self, name: &str, frame: Option<&Frame>) -> Probe {
        let frame = match frame.cloned().or_else(|| self.vision.cached_frame()) {
            Some(frame) => frame,
            None => match self.vision.capture().await {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(interrupt = %name, error = %e, "Capture failed");
                    return Probe::Miss;
                }
            },
        };

        let recognition = self.vision.recognize(name, &frame, None).await;
        log_recognition_error(name, &recognition);
        if !recognition.is_hit() {
            return Probe::Miss;
        }

        debug!(interrupt = %name, "Interrupt detected, executing");
        if self.run_task(name, &PipelineOverride::new()).await {
            Probe::Hit
        } else {
            Probe::Miss
        }
    }

    async fn run_task(&self, entry: &str, overrides: &PipelineOverride) -> bool {
        match self.tasks.run(entry, overrides).await {
            Ok(_) => true,
            Err(e) => {
                warn!(task = %entry, error = %e, "Task failed, treated as a miss");
                false
            }
        }
    }

    fn option_selector(&self) -> OptionSelector<'_> {
        OptionSelector::new(
            self.vision.as_ref(),
            self.tasks.as_ref(),
            &self.selection,
            self.settings.settle(),
        )
    }
}

pub(crate) fn log_recognition_error(name: &str, recognition: &Recognition) {
    if let Recognition::Error(e) = recognition {
        warn!(node = %name, error = %e, "Recognition failed, treated as a miss");
    }
}
