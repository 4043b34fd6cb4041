use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use turnover_core::{TurnoverError, TurnoverResult};

/// 无下一单入住时的保守完成期限
pub const DEFAULT_DEADLINE_HOURS: i64 = 48;

/// 保洁工作窗口：退房时刻到下一单入住时刻之间的区间
///
/// 始终即算即用，不落库。`end < start` 的倒挂窗口（订单重叠或脏数据）
/// 原样透传，由紧急度分级统一按已过期处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WorkWindow {
    /// 由退房时刻与（可选的）下一单入住时刻推导工作窗口
    pub fn for_turnover(checkout: DateTime<Utc>, next_checkin: Option<DateTime<Utc>>) -> Self {
        let end = next_checkin.unwrap_or(checkout + Duration::hours(DEFAULT_DEADLINE_HOURS));
        Self {
            start: checkout,
            end,
        }
    }

    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    /// 距窗口截止还剩多少小时（已过期为负数）
    pub fn hours_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.end - now).num_hours()
    }

    /// 窗口在何时进入紧急（Critical）区间
    pub fn critical_at(&self) -> DateTime<Utc> {
        self.end - Duration::hours(24)
    }
}

/// 紧急度分级，严重程度排序：Overdue < Critical < Warning < Normal
///
/// 排序即展示顺序（最紧急在前）。每次读取时基于调用方时钟重新计算，
/// 永不缓存、永不持久化。
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Overdue,
    Critical,
    Warning,
    Normal,
}

impl UrgencyLevel {
    /// 由工作窗口与当前时刻分级
    ///
    /// 倒挂窗口直接按已过期处理，保证任务仍然可见而不是抛错丢弃。
    pub fn classify(window: &WorkWindow, now: DateTime<Utc>) -> Self {
        if window.is_inverted() || now > window.end {
            return UrgencyLevel::Overdue;
        }
        let remaining = window.end - now;
        if remaining <= Duration::hours(24) {
            UrgencyLevel::Critical
        } else if remaining <= Duration::hours(48) {
            UrgencyLevel::Warning
        } else {
            UrgencyLevel::Normal
        }
    }

    /// 紧急/已过期任务允许突破单任务限制
    pub fn allows_override(&self) -> bool {
        matches!(self, UrgencyLevel::Overdue | UrgencyLevel::Critical)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UrgencyLevel::Overdue => "overdue",
            UrgencyLevel::Critical => "critical",
            UrgencyLevel::Warning => "warning",
            UrgencyLevel::Normal => "normal",
        }
    }
}

/// 结算周期（自然月）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementPeriod {
    pub year: i32,
    pub month: u32,
}

impl SettlementPeriod {
    pub fn new(year: i32, month: u32) -> TurnoverResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(TurnoverError::InvalidPeriod(format!(
                "月份超出范围: {month}"
            )));
        }
        Ok(Self { year, month })
    }

    /// 解析 "YYYY-MM" 形式的周期标识
    pub fn parse(s: &str) -> TurnoverResult<Self> {
        let mut parts = s.splitn(2, '-');
        let year = parts
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(|| TurnoverError::InvalidPeriod(s.to_string()))?;
        let month = parts
            .next()
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| TurnoverError::InvalidPeriod(s.to_string()))?;
        Self::new(year, month)
    }

    pub fn of(instant: DateTime<Utc>) -> Self {
        Self {
            year: instant.year(),
            month: instant.month(),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(self.year, self.month, 1, 0, 0, 0)
            .single()
            .expect("合法的周期起点")
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// 周期的开区间终点（下月首日零点）
    pub fn end_exclusive(&self) -> DateTime<Utc> {
        self.next().start()
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start() && instant < self.end_exclusive()
    }
}

impl std::fmt::Display for SettlementPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// 结算分桶：已到账 / 待回款
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SettlementBucket {
    Received,
    Pending,
}

/// 操作者身份：每个操作都显式传入，不依赖全局角色状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: ActorRole,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Worker,
    Manager,
}

impl Actor {
    pub fn worker<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::Worker,
        }
    }
    pub fn manager<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            role: ActorRole::Manager,
        }
    }
    pub fn can_administer(&self) -> bool {
        matches!(self.role, ActorRole::Manager)
    }
}
