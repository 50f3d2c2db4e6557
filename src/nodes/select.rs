use std::time::Duration;
use tracing::{debug, error, warn};
use crate::compiler::expander::{Expander, Template};
use crate::config::SelectionSettings;
use crate::dsl::OrderBy;
use crate::runtime::context::Session;
use crate::runtime::engine::{log_recognition_error, Probe};
use crate::runtime::pipeline::Expansion;
use crate::runtime::task::{TaskEngine, TaskStatus};
use crate::runtime::vision::Vision;

/// 选项选择 (SelectOption / SelectEncounterOption)
///
/// Each call checks that the option screen is on display, expands the template
/// nodes for the request and hands the fragment to the task engine. The probe is
/// a hit only when the task engine reports that an expanded node matched.
pub struct OptionSelector<'a> {
    vision: &'a dyn Vision,
    tasks: &'a dyn TaskEngine,
    names: &'a SelectionSettings,
    settle: Duration,
    expander: Expander,
}

impl<'a> OptionSelector<'a> {
    pub fn new(
        vision: &'a dyn Vision,
        tasks: &'a dyn TaskEngine,
        names: &'a SelectionSettings,
        settle: Duration,
    ) -> Self {
        Self {
            vision,
            tasks,
            names,
            settle,
            expander: Expander::new(),
        }
    }

    pub async fn select_by_text(
        &self,
        session: &Session,
        expected: &[String],
        order_by: OrderBy,
        index: i64,
    ) -> Probe {
        let template_name = self.names.option_text_template.as_str();
        let Some(template) = self.tasks.node_data(template_name) else {
            error!(template = %template_name, "Option template node not found");
            return Probe::Miss;
        };

        if !self.screen_present(&self.names.option_screen).await {
            return Probe::Miss;
        }

        let parent = self.tasks.node_data(&self.names.option_screen);
        let expansion = self.expander.expand_text_choices(
            Template::new(&self.names.option_screen, parent.as_ref()),
            Template::new(template_name, Some(&template)),
            expected,
            order_by,
            index,
        );

        debug!(?expected, ?order_by, index, "Selecting option by text");
        self.dispatch(session, expansion).await
    }

    pub async fn select_by_position(&self, session: &Session, order_by: OrderBy, index: i64) -> Probe {
        if session.is_cancelled() {
            return Probe::Cancelled;
        }
        if !self.screen_present(&self.names.option_screen).await {
            return Probe::Miss;
        }

        let parent = self.tasks.node_data(&self.names.option_screen);
        let expansion = self.expander.expand_position_choice(
            Template::new(&self.names.option_screen, parent.as_ref()),
            &self.names.option_position_node,
            order_by,
            index,
        );

        debug!(?order_by, index, "Selecting option by position");
        self.dispatch(session, expansion).await
    }

    pub async fn select_encounter_by_text(
        &self,
        session: &Session,
        expected: &[String],
        order_by: OrderBy,
    ) -> Probe {
        if !self.encounter_screen_present().await {
            return Probe::Miss;
        }

        let expansion = self.expander.expand_encounter_text(
            &self.names.encounter_text_node,
            &self.names.encounter_screen,
            expected,
            order_by,
        );

        debug!(?expected, ?order_by, "Selecting encounter option by text");
        self.dispatch(session, expansion).await
    }

    pub async fn select_encounter_by_position(
        &self,
        session: &Session,
        order_by: OrderBy,
        index: i64,
    ) -> Probe {
        if session.is_cancelled() {
            return Probe::Cancelled;
        }
        if !self.encounter_screen_present().await {
            return Probe::Miss;
        }

        let expansion = self.expander.expand_encounter_position(
            &self.names.encounter_position_node,
            &self.names.encounter_screen,
            order_by,
            index,
        );

        debug!(?order_by, index, "Selecting encounter option by position");
        self.dispatch(session, expansion).await
    }

    async fn encounter_screen_present(&self) -> bool {
        tokio::time::sleep(self.settle).await;
        let present = self.screen_present(&self.names.encounter_screen).await;
        if !present {
            debug!("Encounter option screen not found, skipping");
        }
        present
    }

    async fn screen_present(&self, screen: &str) -> bool {
        let frame = match self.vision.capture().await {
            Ok(frame) => frame,
            Err(e) => {
                warn!(screen = %screen, error = %e, "Capture failed");
                return false;
            }
        };

        let recognition = self.vision.recognize(screen, &frame, None).await;
        log_recognition_error(screen, &recognition);
        recognition.is_hit()
    }

    async fn dispatch(&self, session: &Session, expansion: Expansion) -> Probe {
        if session.is_cancelled() {
            return Probe::Cancelled;
        }

        let entry = expansion.entry.clone();
        let overrides = expansion.into_override();
        match self.tasks.run(&entry, &overrides).await {
            Ok(TaskStatus::Succeeded) => Probe::Hit,
            Ok(TaskStatus::Failed) => {
                debug!(task = %entry, "No expanded option matched");
                Probe::Miss
            }
            Err(e) => {
                warn!(task = %entry, error = %e, "Task failed, treated as a miss");
                Probe::Miss
            }
        }
    }
}
