use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// 会话内 "最多执行一次" 的动作计数
///
/// Only names listed at construction are tracked; every other name is never
/// suppressed.
#[derive(Debug, Default)]
pub struct RunOnceRegistry {
    tracked: HashSet<String>,
    // Map<ActionName, AtomicCounter>
    counters: DashMap<String, Arc<AtomicUsize>>,
}

impl RunOnceRegistry {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tracked: names.into_iter().map(Into::into).collect(),
            counters: DashMap::new(),
        }
    }

    pub fn is_tracked(&self, name: &str) -> bool {
        self.tracked.contains(name)
    }

    /// True when `name` is tracked and has already run in this session.
    pub fn should_skip(&self, name: &str) -> bool {
        self.is_tracked(name) && self.count(name) > 0
    }

    /// Records a successful run. Returns the new count, or `None` for untracked names.
    pub fn record(&self, name: &str) -> Option<usize> {
        if !self.is_tracked(name) {
            return None;
        }

        let counter = self
            .counters
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AtomicUsize::new(0)))
            .value()
            .clone();

        Some(counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn count(&self, name: &str) -> usize {
        self.counters
            .get(name)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// 会话边界清零
    pub fn reset(&self) {
        self.counters.clear();
    }
}
