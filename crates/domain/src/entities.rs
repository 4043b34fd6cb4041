use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{UrgencyLevel, WorkWindow};

/// 订单来源平台
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Airbnb,
    Booking,
    Direct,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Airbnb => "airbnb",
            Platform::Booking => "booking",
            Platform::Direct => "direct",
        }
    }

    /// Booking 平台固定跨一个结算周期回款，其余平台当期结算
    pub fn settles_next_cycle(&self) -> bool {
        matches!(self, Platform::Booking)
    }
}

impl sqlx::Type<sqlx::Postgres> for Platform {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl sqlx::Type<sqlx::Sqlite> for Platform {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Platform {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "airbnb" => Ok(Platform::Airbnb),
            "booking" => Ok(Platform::Booking),
            "direct" => Ok(Platform::Direct),
            _ => Err(format!("Invalid platform: {s}").into()),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for Platform {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "airbnb" => Ok(Platform::Airbnb),
            "booking" => Ok(Platform::Booking),
            "direct" => Ok(Platform::Direct),
            _ => Err(format!("Invalid platform: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for Platform {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for Platform {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 保洁费回款状态（平台内部标记）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for PaymentStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl sqlx::Type<sqlx::Sqlite> for PaymentStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for PaymentStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "pending" => Ok(PaymentStatus::Pending),
            _ => Err(format!("Invalid payment status: {s}").into()),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for PaymentStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "paid" => Ok(PaymentStatus::Paid),
            "pending" => Ok(PaymentStatus::Pending),
            _ => Err(format!("Invalid payment status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for PaymentStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for PaymentStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 保洁状态：待打扫 / 已完成
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CleaningStatus {
    Pending,
    Done,
}

impl CleaningStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleaningStatus::Pending => "pending",
            CleaningStatus::Done => "done",
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for CleaningStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl sqlx::Type<sqlx::Sqlite> for CleaningStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for CleaningStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "pending" => Ok(CleaningStatus::Pending),
            "done" => Ok(CleaningStatus::Done),
            _ => Err(format!("Invalid cleaning status: {s}").into()),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for CleaningStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "pending" => Ok(CleaningStatus::Pending),
            "done" => Ok(CleaningStatus::Done),
            _ => Err(format!("Invalid cleaning status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for CleaningStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for CleaningStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 订单状态（取消的订单不产生保洁任务）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for ReservationStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        sqlx::postgres::PgTypeInfo::with_name("VARCHAR")
    }
}

impl sqlx::Type<sqlx::Sqlite> for ReservationStatus {
    fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
        <str as sqlx::Type<sqlx::Sqlite>>::type_info()
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for ReservationStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        match s {
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(format!("Invalid reservation status: {s}").into()),
        }
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for ReservationStatus {
    fn decode(value: sqlx::sqlite::SqliteValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <&str as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
        match s {
            "confirmed" => Ok(ReservationStatus::Confirmed),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(format!("Invalid reservation status: {s}").into()),
        }
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for ReservationStatus {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Postgres>>::encode(self.as_str(), buf)
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for ReservationStatus {
    fn encode_by_ref(
        &self,
        buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
    ) -> Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>> {
        <&str as sqlx::Encode<sqlx::Sqlite>>::encode(self.as_str(), buf)
    }
}

/// 订单记录（外部订单/房源存储的行结构，本核心只写回指派与保洁状态）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub property_id: i64,
    pub platform: Platform,
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
    pub cleaning_fee: Option<f64>,
    pub cleaning_status: CleaningStatus,
    pub cleaning_payment_status: PaymentStatus,
    pub assigned_worker_id: Option<String>,
    pub cleaning_rating: Option<i16>,
    pub cleaning_notes: Option<String>,
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn new(
        property_id: i64,
        platform: Platform,
        check_in: DateTime<Utc>,
        check_out: DateTime<Utc>,
        cleaning_fee: Option<f64>,
    ) -> Self {
        Self {
            id: 0, // 将由数据库生成
            property_id,
            platform,
            check_in,
            check_out,
            cleaning_fee,
            cleaning_status: CleaningStatus::Pending,
            cleaning_payment_status: PaymentStatus::Pending,
            assigned_worker_id: None,
            cleaning_rating: None,
            cleaning_notes: None,
            status: ReservationStatus::Confirmed,
        }
    }
}

/// 保洁任务：与一条订单一一对应的派生视图
///
/// `next_checkin_at` 由仓储在读取时解析（同一房源下一单入住时刻），
/// 任务本身不单独落库，订单删除则任务随之消失。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningTask {
    pub id: i64,
    pub property_id: i64,
    pub platform: Platform,
    pub checkout_at: DateTime<Utc>,
    pub next_checkin_at: Option<DateTime<Utc>>,
    pub fee: Option<f64>,
    pub payment_status: PaymentStatus,
    pub cleaning_status: CleaningStatus,
    pub assigned_worker_id: Option<String>,
    pub rating: Option<i16>,
    pub notes: Option<String>,
}

impl CleaningTask {
    pub fn work_window(&self) -> WorkWindow {
        WorkWindow::for_turnover(self.checkout_at, self.next_checkin_at)
    }

    pub fn urgency(&self, now: DateTime<Utc>) -> UrgencyLevel {
        UrgencyLevel::classify(&self.work_window(), now)
    }

    pub fn is_available(&self) -> bool {
        self.assigned_worker_id.is_none() && self.cleaning_status == CleaningStatus::Pending
    }

    pub fn is_done(&self) -> bool {
        self.cleaning_status == CleaningStatus::Done
    }

    pub fn is_assigned_to(&self, worker_id: &str) -> bool {
        self.assigned_worker_id.as_deref() == Some(worker_id)
    }

    pub fn entity_description(&self) -> String {
        match &self.assigned_worker_id {
            Some(worker_id) => format!(
                "保洁任务 (ID: {}, 房源: {}, 保洁员: {})",
                self.id, self.property_id, worker_id
            ),
            None => format!("保洁任务 (ID: {}, 房源: {})", self.id, self.property_id),
        }
    }
}

/// 保洁员
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub display_name: String,
    /// 可服务的房源范围；空列表表示不可接单
    pub serviceable_property_ids: Vec<i64>,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

impl Worker {
    pub fn new(id: String, display_name: String, serviceable_property_ids: Vec<i64>) -> Self {
        Self {
            id,
            display_name,
            serviceable_property_ids,
            active: true,
            registered_at: Utc::now(),
        }
    }

    pub fn can_service(&self, property_id: i64) -> bool {
        self.active && self.serviceable_property_ids.contains(&property_id)
    }
}

/// 任务列表排序键：先按紧急度（最紧急在前），再按退房时间升序
pub fn sort_by_urgency(tasks: &mut [CleaningTask], now: DateTime<Utc>) {
    tasks.sort_by_key(|t| (t.urgency(now), t.checkout_at));
}
