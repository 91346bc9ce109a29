//! Appointment repository

use crate::models::{Appointment, AppointmentFilter};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment>;
    async fn get_by_id(&self, id: Uuid) -> Result<Option<Appointment>>;
    async fn update(&self, appointment: &Appointment) -> Result<Appointment>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    /// Matching appointments ordered by date, time
    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>>;
    async fn list_for_interviewer(
        &self,
        interviewer_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>>;
    async fn list_for_cras_day(&self, cras_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>>;
    /// The active appointment holding an interviewer slot, if any
    async fn find_active_in_slot(
        &self,
        interviewer_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>>;
}

/// Appointment storage kept in process memory
#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    items: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn boxed() -> Arc<dyn AppointmentRepository> {
        Arc::new(Self::new())
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<Appointment>
    where
        F: Fn(&Appointment) -> bool,
    {
        let items = self.items.read().await;
        let mut result: Vec<Appointment> = items.values().filter(|a| predicate(a)).cloned().collect();
        result.sort_by(|a, b| (a.date, a.time, a.created_at).cmp(&(b.date, b.time, b.created_at)));
        result
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn create(&self, appointment: &Appointment) -> Result<Appointment> {
        let mut items = self.items.write().await;
        if items.contains_key(&appointment.id) {
            anyhow::bail!("Appointment {} already exists", appointment.id);
        }
        items.insert(appointment.id, appointment.clone());
        Ok(appointment.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Appointment>> {
        Ok(self.items.read().await.get(&id).cloned())
    }

    async fn update(&self, appointment: &Appointment) -> Result<Appointment> {
        let mut items = self.items.write().await;
        match items.get_mut(&appointment.id) {
            Some(slot) => {
                *slot = appointment.clone();
                Ok(appointment.clone())
            }
            None => anyhow::bail!("Appointment {} not found", appointment.id),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.items.write().await.remove(&id);
        Ok(())
    }

    async fn list(&self, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
        Ok(self.filtered(|a| filter.matches(a)).await)
    }

    async fn list_for_interviewer(
        &self,
        interviewer_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Appointment>> {
        Ok(self
            .filtered(|a| a.interviewer_id == interviewer_id && a.date >= from && a.date <= to)
            .await)
    }

    async fn list_for_cras_day(&self, cras_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>> {
        Ok(self.filtered(|a| a.cras_id == cras_id && a.date == date).await)
    }

    async fn find_active_in_slot(
        &self,
        interviewer_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<Appointment>> {
        let items = self.items.read().await;
        Ok(items
            .values()
            .find(|a| a.occupies(interviewer_id, date, time))
            .cloned())
    }
}
