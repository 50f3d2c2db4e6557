#![allow(dead_code)]

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use eventpath::runtime::pipeline::PipelineOverride;
use eventpath::runtime::task::{TaskEngine, TaskStatus};
use eventpath::runtime::vision::{Frame, Recognition, Vision};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Every collaborator call, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Capture,
    Recognize(String),
    Run(String),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// Scripted vision: per-name queues of results, falling back to a per-name default
/// and finally to a miss.
pub struct FakeVision {
    log: CallLog,
    seq: AtomicU64,
    scripts: Mutex<HashMap<String, VecDeque<Recognition>>>,
    defaults: Mutex<HashMap<String, Recognition>>,
    cancel_on: Mutex<HashMap<String, CancellationToken>>,
    fail_capture: bool,
}

impl FakeVision {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            seq: AtomicU64::new(0),
            scripts: Mutex::new(HashMap::new()),
            defaults: Mutex::new(HashMap::new()),
            cancel_on: Mutex::new(HashMap::new()),
            fail_capture: false,
        }
    }

    pub fn failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    pub fn always(self, name: &str, recognition: Recognition) -> Self {
        self.defaults.lock().unwrap().insert(name.to_string(), recognition);
        self
    }

    pub fn script(self, name: &str, results: Vec<Recognition>) -> Self {
        self.scripts.lock().unwrap().insert(name.to_string(), results.into());
        self
    }

    /// Miss on every probe of `name` except the `n`th (1-based).
    pub fn hit_on_probe(self, name: &str, n: usize) -> Self {
        let mut results = vec![Recognition::miss(); n - 1];
        results.push(Recognition::hit());
        self.script(name, results)
    }

    /// Cancel `token` the moment `name` is recognized.
    pub fn cancel_when_probed(self, name: &str, token: CancellationToken) -> Self {
        self.cancel_on.lock().unwrap().insert(name.to_string(), token);
        self
    }
}

#[async_trait]
impl Vision for FakeVision {
    async fn capture(&self) -> Result<Frame> {
        self.log.lock().unwrap().push(Call::Capture);
        if self.fail_capture {
            return Err(anyhow!("screencap timed out"));
        }
        Ok(Frame::new(self.seq.fetch_add(1, Ordering::SeqCst)))
    }

    fn cached_frame(&self) -> Option<Frame> {
        None
    }

    async fn recognize(
        &self,
        name: &str,
        _frame: &Frame,
        _overrides: Option<&PipelineOverride>,
    ) -> Recognition {
        self.log.lock().unwrap().push(Call::Recognize(name.to_string()));

        if let Some(token) = self.cancel_on.lock().unwrap().get(name) {
            token.cancel();
        }

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(name)
            .and_then(|queue| queue.pop_front());

        scripted
            .or_else(|| self.defaults.lock().unwrap().get(name).cloned())
            .unwrap_or_else(Recognition::miss)
    }
}

type Handler = Box<dyn Fn(&str, &PipelineOverride) -> Result<TaskStatus> + Send + Sync>;

pub struct FakeTasks {
    log: CallLog,
    nodes: HashMap<String, Value>,
    handler: Option<Handler>,
    pub overrides: Mutex<Vec<(String, PipelineOverride)>>,
}

impl FakeTasks {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            nodes: HashMap::new(),
            handler: None,
            overrides: Mutex::new(Vec::new()),
        }
    }

    pub fn with_node(mut self, name: &str, definition: Value) -> Self {
        self.nodes.insert(name.to_string(), definition);
        self
    }

    pub fn with_handler(
        mut self,
        handler: impl Fn(&str, &PipelineOverride) -> Result<TaskStatus> + Send + Sync + 'static,
    ) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    pub fn last_override(&self) -> Option<(String, PipelineOverride)> {
        self.overrides.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl TaskEngine for FakeTasks {
    async fn run(&self, entry: &str, overrides: &PipelineOverride) -> Result<TaskStatus> {
        self.log.lock().unwrap().push(Call::Run(entry.to_string()));
        self.overrides
            .lock()
            .unwrap()
            .push((entry.to_string(), overrides.clone()));

        match &self.handler {
            Some(handler) => handler(entry, overrides),
            None => Ok(TaskStatus::Succeeded),
        }
    }

    fn node_data(&self, name: &str) -> Option<Value> {
        self.nodes.get(name).cloned()
    }
}

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recognitions(log: &CallLog, name: &str) -> usize {
    log.lock()
        .unwrap()
        .iter()
        .filter(|c| matches!(c, Call::Recognize(n) if n == name))
        .count()
}

pub fn runs(log: &CallLog) -> Vec<String> {
    log.lock()
        .unwrap()
        .iter()
        .filter_map(|c| match c {
            Call::Run(n) => Some(n.clone()),
            _ => None,
        })
        .collect()
}
