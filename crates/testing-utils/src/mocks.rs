//! Mock implementations for the repository traits
//!
//! In-memory implementations that can be used for unit testing without a
//! database connection. The conditional writes hold the map lock for the
//! whole check-and-set, so claim races behave like the store-side
//! compare-and-swap they stand in for.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use turnover_core::TurnoverResult;
use turnover_domain::entities::{
    CleaningStatus, CleaningTask, Reservation, ReservationStatus, Worker,
};
use turnover_domain::repositories::{TaskRepository, WorkerRepository};

/// Mock implementation of TaskRepository for testing
#[derive(Debug, Clone)]
pub struct MockTaskRepository {
    reservations: Arc<Mutex<HashMap<i64, Reservation>>>,
    next_id: Arc<Mutex<i64>>,
}

impl Default for MockTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTaskRepository {
    pub fn new() -> Self {
        Self {
            reservations: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    pub fn with_reservations(reservations: Vec<Reservation>) -> Self {
        let mut map = HashMap::new();
        let mut max_id = 0;
        for reservation in reservations {
            if reservation.id > max_id {
                max_id = reservation.id;
            }
            map.insert(reservation.id, reservation);
        }
        Self {
            reservations: Arc::new(Mutex::new(map)),
            next_id: Arc::new(Mutex::new(max_id + 1)),
        }
    }

    pub fn count(&self) -> usize {
        self.reservations.lock().unwrap().len()
    }

    pub fn get_raw(&self, id: i64) -> Option<Reservation> {
        self.reservations.lock().unwrap().get(&id).cloned()
    }

    /// Derive the task view the way the SQL repositories do: the deadline
    /// comes from the chronologically next non-cancelled reservation at the
    /// same property.
    fn derive_task(map: &HashMap<i64, Reservation>, reservation: &Reservation) -> CleaningTask {
        let next_checkin_at = map
            .values()
            .filter(|other| {
                other.id != reservation.id
                    && other.property_id == reservation.property_id
                    && other.status != ReservationStatus::Cancelled
                    && other.check_in >= reservation.check_out
            })
            .map(|other| other.check_in)
            .min();

        CleaningTask {
            id: reservation.id,
            property_id: reservation.property_id,
            platform: reservation.platform,
            checkout_at: reservation.check_out,
            next_checkin_at,
            fee: reservation.cleaning_fee,
            payment_status: reservation.cleaning_payment_status,
            cleaning_status: reservation.cleaning_status,
            assigned_worker_id: reservation.assigned_worker_id.clone(),
            rating: reservation.cleaning_rating,
            notes: reservation.cleaning_notes.clone(),
        }
    }

    fn collect_tasks<F>(&self, predicate: F) -> Vec<CleaningTask>
    where
        F: Fn(&Reservation) -> bool,
    {
        let map = self.reservations.lock().unwrap();
        map.values()
            .filter(|r| r.status != ReservationStatus::Cancelled && predicate(r))
            .map(|r| Self::derive_task(&map, r))
            .collect()
    }
}

#[async_trait]
impl TaskRepository for MockTaskRepository {
    async fn create(&self, reservation: &Reservation) -> TurnoverResult<Reservation> {
        let mut map = self.reservations.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();

        let mut created = reservation.clone();
        if created.id == 0 {
            created.id = *next_id;
        }
        if created.id >= *next_id {
            *next_id = created.id + 1;
        }
        map.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> TurnoverResult<Option<CleaningTask>> {
        let map = self.reservations.lock().unwrap();
        Ok(map
            .get(&id)
            .filter(|r| r.status != ReservationStatus::Cancelled)
            .map(|r| Self::derive_task(&map, r)))
    }

    async fn list_available_for_properties(
        &self,
        property_ids: &[i64],
    ) -> TurnoverResult<Vec<CleaningTask>> {
        Ok(self.collect_tasks(|r| {
            r.assigned_worker_id.is_none()
                && r.cleaning_status == CleaningStatus::Pending
                && property_ids.contains(&r.property_id)
        }))
    }

    async fn list_unassigned_pending(&self) -> TurnoverResult<Vec<CleaningTask>> {
        Ok(self.collect_tasks(|r| {
            r.assigned_worker_id.is_none() && r.cleaning_status == CleaningStatus::Pending
        }))
    }

    async fn list_assigned_to(&self, worker_id: &str) -> TurnoverResult<Vec<CleaningTask>> {
        Ok(self.collect_tasks(|r| {
            r.assigned_worker_id.as_deref() == Some(worker_id)
                && r.cleaning_status == CleaningStatus::Pending
        }))
    }

    async fn list_pending(&self) -> TurnoverResult<Vec<CleaningTask>> {
        Ok(self.collect_tasks(|r| r.cleaning_status == CleaningStatus::Pending))
    }

    async fn list_completed_for_worker(
        &self,
        worker_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> TurnoverResult<Vec<CleaningTask>> {
        Ok(self.collect_tasks(|r| {
            r.assigned_worker_id.as_deref() == Some(worker_id)
                && r.cleaning_status == CleaningStatus::Done
                && r.check_out >= from
                && r.check_out < to
        }))
    }

    async fn try_claim(&self, task_id: i64, worker_id: &str) -> TurnoverResult<bool> {
        let mut map = self.reservations.lock().unwrap();
        match map.get_mut(&task_id) {
            Some(r)
                if r.status != ReservationStatus::Cancelled
                    && r.assigned_worker_id.is_none()
                    && r.cleaning_status == CleaningStatus::Pending =>
            {
                r.assigned_worker_id = Some(worker_id.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_complete(&self, task_id: i64, worker_id: &str) -> TurnoverResult<bool> {
        let mut map = self.reservations.lock().unwrap();
        match map.get_mut(&task_id) {
            Some(r)
                if r.assigned_worker_id.as_deref() == Some(worker_id)
                    && r.cleaning_status == CleaningStatus::Pending =>
            {
                r.cleaning_status = CleaningStatus::Done;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn try_assign(&self, task_id: i64, worker_id: Option<&str>) -> TurnoverResult<bool> {
        let mut map = self.reservations.lock().unwrap();
        match map.get_mut(&task_id) {
            Some(r) if r.cleaning_status != CleaningStatus::Done => {
                r.assigned_worker_id = worker_id.map(|w| w.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_feedback(
        &self,
        task_id: i64,
        rating: Option<i16>,
        notes: Option<&str>,
    ) -> TurnoverResult<bool> {
        let mut map = self.reservations.lock().unwrap();
        match map.get_mut(&task_id) {
            Some(r) => {
                if rating.is_some() {
                    r.cleaning_rating = rating;
                }
                if let Some(notes) = notes {
                    r.cleaning_notes = Some(notes.to_string());
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Mock implementation of WorkerRepository for testing
#[derive(Debug, Clone)]
pub struct MockWorkerRepository {
    workers: Arc<Mutex<HashMap<String, Worker>>>,
}

impl Default for MockWorkerRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWorkerRepository {
    pub fn new() -> Self {
        Self {
            workers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_workers(workers: Vec<Worker>) -> Self {
        let map = workers.into_iter().map(|w| (w.id.clone(), w)).collect();
        Self {
            workers: Arc::new(Mutex::new(map)),
        }
    }
}

#[async_trait]
impl WorkerRepository for MockWorkerRepository {
    async fn register(&self, worker: &Worker) -> TurnoverResult<Worker> {
        let mut map = self.workers.lock().unwrap();
        map.insert(worker.id.clone(), worker.clone());
        Ok(worker.clone())
    }

    async fn get_by_id(&self, id: &str) -> TurnoverResult<Option<Worker>> {
        let map = self.workers.lock().unwrap();
        Ok(map.get(id).cloned())
    }

    async fn get_all(&self) -> TurnoverResult<Vec<Worker>> {
        let map = self.workers.lock().unwrap();
        Ok(map.values().cloned().collect())
    }

    async fn update(&self, worker: &Worker) -> TurnoverResult<()> {
        let mut map = self.workers.lock().unwrap();
        map.insert(worker.id.clone(), worker.clone());
        Ok(())
    }

    async fn unregister(&self, id: &str) -> TurnoverResult<bool> {
        let mut map = self.workers.lock().unwrap();
        Ok(map.remove(id).is_some())
    }
}
