use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use turnover_core::TurnoverResult;
use turnover_domain::entities::{CleaningTask, PaymentStatus, Platform};
use turnover_domain::repositories::TaskRepository;
use turnover_domain::value_objects::{SettlementBucket, SettlementPeriod};

/// 结算明细行
#[derive(Debug, Clone, Serialize)]
pub struct SettlementLine {
    pub task_id: i64,
    pub property_id: i64,
    pub platform: Platform,
    pub checkout_at: DateTime<Utc>,
    pub fee: f64,
    pub bucket: SettlementBucket,
}

/// 某保洁员某结算周期的对账单
#[derive(Debug, Clone, Serialize)]
pub struct SettlementStatement {
    pub worker_id: String,
    pub period: SettlementPeriod,
    pub received_total: f64,
    pub pending_total: f64,
    pub line_items: Vec<SettlementLine>,
}

/// 结算计算器
///
/// 对某保洁员在自然月内已完成的任务按平台回款规则分桶：
/// airbnb/direct 当期结算，回款标记为已支付即计入已到账；
/// booking 固定跨一个周期回款，费用始终记在退房所在周期的待回款桶，
/// 后续支付标记翻转也不会把它改记为该周期的已到账。
pub struct SettlementCalculator {
    task_repo: Arc<dyn TaskRepository>,
}

impl SettlementCalculator {
    pub fn new(task_repo: Arc<dyn TaskRepository>) -> Self {
        Self { task_repo }
    }

    pub async fn settle(
        &self,
        worker_id: &str,
        period: SettlementPeriod,
    ) -> TurnoverResult<SettlementStatement> {
        let tasks = self
            .task_repo
            .list_completed_for_worker(worker_id, period.start(), period.end_exclusive())
            .await?;

        debug!(
            "结算 {}：周期 {} 内共有 {} 条已完成任务",
            worker_id,
            period,
            tasks.len()
        );

        let mut received_total = 0.0;
        let mut pending_total = 0.0;
        let mut line_items = Vec::with_capacity(tasks.len());

        for task in &tasks {
            let line = Self::classify(task);
            match line.bucket {
                SettlementBucket::Received => received_total += line.fee,
                SettlementBucket::Pending => pending_total += line.fee,
            }
            line_items.push(line);
        }

        line_items.sort_by_key(|line| (line.checkout_at, line.task_id));

        Ok(SettlementStatement {
            worker_id: worker_id.to_string(),
            period,
            received_total,
            pending_total,
            line_items,
        })
    }

    /// 单条任务的结算分桶；缺失费用按0计并告警，不中断整批结算
    fn classify(task: &CleaningTask) -> SettlementLine {
        let fee = match task.fee {
            Some(fee) => fee,
            None => {
                warn!(
                    "任务 {} 缺失保洁费，按 0 计入结算（房源: {}）",
                    task.id, task.property_id
                );
                0.0
            }
        };

        let bucket = if task.platform.settles_next_cycle() {
            SettlementBucket::Pending
        } else if task.payment_status == PaymentStatus::Paid {
            SettlementBucket::Received
        } else {
            SettlementBucket::Pending
        };

        SettlementLine {
            task_id: task.id,
            property_id: task.property_id,
            platform: task.platform,
            checkout_at: task.checkout_at,
            fee,
            bucket,
        }
    }
}
