//! Test data builders for creating test entities
//!
//! Builder patterns with sensible defaults and easy customization.

use chrono::{DateTime, Duration, Utc};
use turnover_domain::entities::{
    CleaningStatus, PaymentStatus, Platform, Reservation, ReservationStatus, Worker,
};

/// Builder for creating test Reservation entities
pub struct ReservationBuilder {
    reservation: Reservation,
}

impl ReservationBuilder {
    pub fn new() -> Self {
        let check_in = Utc::now() - Duration::days(2);
        Self {
            reservation: Reservation {
                id: 0,
                property_id: 1,
                platform: Platform::Airbnb,
                check_in,
                check_out: check_in + Duration::days(2),
                cleaning_fee: Some(100.0),
                cleaning_status: CleaningStatus::Pending,
                cleaning_payment_status: PaymentStatus::Pending,
                assigned_worker_id: None,
                cleaning_rating: None,
                cleaning_notes: None,
                status: ReservationStatus::Confirmed,
            },
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.reservation.id = id;
        self
    }

    pub fn with_property(mut self, property_id: i64) -> Self {
        self.reservation.property_id = property_id;
        self
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.reservation.platform = platform;
        self
    }

    pub fn with_stay(mut self, check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Self {
        self.reservation.check_in = check_in;
        self.reservation.check_out = check_out;
        self
    }

    /// Checkout at the given offset from now; the stay started two days before.
    pub fn checkout_in_hours(mut self, hours: i64) -> Self {
        self.reservation.check_out = Utc::now() + Duration::hours(hours);
        self.reservation.check_in = self.reservation.check_out - Duration::days(2);
        self
    }

    pub fn with_fee(mut self, fee: f64) -> Self {
        self.reservation.cleaning_fee = Some(fee);
        self
    }

    pub fn without_fee(mut self) -> Self {
        self.reservation.cleaning_fee = None;
        self
    }

    pub fn paid(mut self) -> Self {
        self.reservation.cleaning_payment_status = PaymentStatus::Paid;
        self
    }

    pub fn assigned_to(mut self, worker_id: &str) -> Self {
        self.reservation.assigned_worker_id = Some(worker_id.to_string());
        self
    }

    pub fn completed_by(mut self, worker_id: &str) -> Self {
        self.reservation.assigned_worker_id = Some(worker_id.to_string());
        self.reservation.cleaning_status = CleaningStatus::Done;
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.reservation.status = ReservationStatus::Cancelled;
        self
    }

    pub fn build(self) -> Reservation {
        self.reservation
    }
}

impl Default for ReservationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for creating test Worker entities
pub struct WorkerBuilder {
    worker: Worker,
}

impl WorkerBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            worker: Worker {
                id: id.to_string(),
                display_name: format!("worker {id}"),
                serviceable_property_ids: vec![1],
                active: true,
                registered_at: Utc::now(),
            },
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.worker.display_name = name.to_string();
        self
    }

    pub fn with_properties(mut self, property_ids: Vec<i64>) -> Self {
        self.worker.serviceable_property_ids = property_ids;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.worker.active = false;
        self
    }

    pub fn build(self) -> Worker {
        self.worker
    }
}
