use tokio::sync::watch;
use tracing::{debug, info};

/// 优雅关闭协调器
///
/// 基于 watch 通道：`shutdown()` 把状态翻到已关闭，所有订阅者
/// （包括关闭之后才订阅的）都能立刻观察到。
pub struct ShutdownManager {
    state: watch::Sender<bool>,
}

/// 单个订阅者持有的关闭信号
pub struct ShutdownSignal {
    state: watch::Receiver<bool>,
}

impl ShutdownManager {
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            state: self.state.subscribe(),
        }
    }

    pub fn is_shutdown(&self) -> bool {
        *self.state.borrow()
    }

    /// 触发关闭；重复调用是无操作
    pub fn shutdown(&self) {
        if self.state.send_replace(true) {
            debug!("关闭已经触发过，忽略重复请求");
            return;
        }
        info!(
            "触发系统关闭，通知 {} 个订阅者",
            self.state.receiver_count()
        );
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// 挂起直到关闭被触发；已关闭时立即返回
    pub async fn wait(&mut self) {
        // 管理器先于所有订阅者存活，wait_for 不会因通道关闭而出错
        let _ = self.state.wait_for(|shut| *shut).await;
    }
}
