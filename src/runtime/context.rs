use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use crate::runtime::storage::RunOnceRegistry;

/// 当前所处节点 (由节点选择写入，节点处理读取)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeCursor {
    pub node_type: String,
    pub event_name: String,
}

/// 自动化会话 (Session Context)
/// 取代进程级全局状态：当前节点/事件、一次性计数、取消信号
#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    cursor: Mutex<NodeCursor>,
    pub run_once: RunOnceRegistry,
    cancellation_token: CancellationToken,
}

impl Session {
    pub fn new(run_once: RunOnceRegistry) -> Self {
        Self::with_cancellation_token(run_once, CancellationToken::new())
    }

    pub fn with_cancellation_token(run_once: RunOnceRegistry, token: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            cursor: Mutex::new(NodeCursor::default()),
            run_once,
            cancellation_token: token,
        }
    }

    pub fn cursor(&self) -> NodeCursor {
        self.lock_cursor().clone()
    }

    pub fn set_node(&self, node_type: &str, event_name: &str) {
        let mut cursor = self.lock_cursor();
        cursor.node_type = node_type.to_string();
        cursor.event_name = event_name.to_string();
    }

    pub fn set_event_name(&self, event_name: &str) {
        self.lock_cursor().event_name = event_name.to_string();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    /// Handle for an external owner to request a stop.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// 会话边界：清空计数与当前节点
    pub fn reset(&self) {
        self.run_once.reset();
        *self.lock_cursor() = NodeCursor::default();
    }

    fn lock_cursor(&self) -> MutexGuard<'_, NodeCursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
