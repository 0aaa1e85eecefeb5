//! Slot store: provisioning, admin enable/disable and computed availability.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, IntoActiveModel, QueryFilter, QueryOrder,
    Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, Result};
use crate::models::appointment::AppointmentStatus;
use crate::models::prelude::*;
use crate::state::DbConn;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSlot {
    #[schema(value_type = String, example = "2025-11-19")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "16:20:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "18:20:00")]
    pub end_time: NaiveTime,
    #[serde(default = "default_max_appointments")]
    pub max_appointments: i32,
}

fn default_max_appointments() -> i32 {
    1
}

/// A slot as seen by a customer choosing a time
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SlotAvailability {
    pub slot_id: i64,
    #[schema(value_type = String)]
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    /// `is_available` and no active appointment at that time
    pub available: bool,
}

/// True when the store rejected a write on a unique index
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[derive(Clone)]
pub struct SlotService {
    db: DbConn,
}

impl SlotService {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    pub async fn provision(&self, center_id: i64, new_slot: NewSlot) -> Result<slot::Model> {
        if new_slot.start_time >= new_slot.end_time {
            return Err(AppError::BadRequest(
                "Slot start time must be before its end time".to_string(),
            ));
        }
        if new_slot.max_appointments < 1 {
            return Err(AppError::BadRequest(
                "max_appointments must be at least 1".to_string(),
            ));
        }

        Center::find_by_id(center_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Center {} not found", center_id)))?;

        let now = Utc::now();
        let model = slot::ActiveModel {
            center_id: Set(center_id),
            slot_date: Set(new_slot.date),
            start_time: Set(new_slot.start_time),
            end_time: Set(new_slot.end_time),
            is_available: Set(true),
            max_appointments: Set(new_slot.max_appointments),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict(format!(
                    "A slot already exists for center {} on {} at {}",
                    center_id,
                    new_slot.date,
                    new_slot.start_time.format("%H:%M")
                ))
            } else {
                AppError::Database(e)
            }
        })?;

        tracing::info!(
            slot_id = created.id,
            center_id,
            date = %created.slot_date,
            start = %created.start_time,
            "Slot provisioned"
        );

        Ok(created)
    }

    pub async fn set_availability(&self, slot_id: i64, is_available: bool) -> Result<slot::Model> {
        let existing = Slot::find_by_id(slot_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Slot {} not found", slot_id)))?;

        let mut model = existing.into_active_model();
        model.is_available = Set(is_available);
        model.updated_at = Set(Utc::now());
        let updated = model.update(&self.db).await?;

        tracing::info!(slot_id, is_available, "Slot availability changed");
        Ok(updated)
    }

    /// Slots of a center on a date, each with its computed availability
    pub async fn availability(
        &self,
        center_id: i64,
        date: NaiveDate,
    ) -> Result<Vec<SlotAvailability>> {
        Center::find_by_id(center_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Center {} not found", center_id)))?;

        let slots = Slot::find()
            .filter(slot::Column::CenterId.eq(center_id))
            .filter(slot::Column::SlotDate.eq(date))
            .order_by_asc(slot::Column::StartTime)
            .all(&self.db)
            .await?;

        let taken: HashSet<NaiveTime> = Appointment::find()
            .filter(appointment::Column::CenterId.eq(center_id))
            .filter(appointment::Column::AppointmentDate.eq(date))
            .filter(appointment::Column::Status.is_not_in(AppointmentStatus::slot_releasing()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|a| a.appointment_time)
            .collect();

        Ok(slots
            .into_iter()
            .map(|s| SlotAvailability {
                slot_id: s.id,
                date: s.slot_date,
                start_time: s.start_time,
                end_time: s.end_time,
                available: s.is_available && !taken.contains(&s.start_time),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn new_slot(start: NaiveTime, end: NaiveTime) -> NewSlot {
        NewSlot {
            date: date(2025, 11, 19),
            start_time: start,
            end_time: end,
            max_appointments: 1,
        }
    }

    #[tokio::test]
    async fn test_provision_rejects_inverted_times() {
        let db = create_test_db().await;
        let center = seed_center(&db, "Centre A", true).await;
        let service = SlotService::new(db);

        let err = service
            .provision(center.id, new_slot(time(18, 20), time(16, 20)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_duplicate_slot_is_a_conflict() {
        let db = create_test_db().await;
        let center = seed_center(&db, "Centre A", true).await;
        let service = SlotService::new(db);

        service
            .provision(center.id, new_slot(time(16, 20), time(18, 20)))
            .await
            .unwrap();
        let err = service
            .provision(center.id, new_slot(time(16, 20), time(18, 20)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_provision_unknown_center() {
        let db = create_test_db().await;
        let service = SlotService::new(db);

        let err = service
            .provision(999, new_slot(time(9, 0), time(10, 0)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_availability_accounts_for_appointments_and_switch() {
        let db = create_test_db().await;
        let center = seed_center(&db, "Centre A", true).await;
        let day = date(2025, 11, 19);
        let taken = seed_slot(&db, center.id, day, time(9, 0)).await;
        let disabled = seed_slot(&db, center.id, day, time(11, 0)).await;
        let free = seed_slot(&db, center.id, day, time(14, 0)).await;
        let released = seed_slot(&db, center.id, day, time(16, 20)).await;
        seed_appointment(&db, Some(center.id), day, time(9, 0), "confirmed").await;
        seed_appointment(&db, Some(center.id), day, time(16, 20), "cancelled").await;

        let service = SlotService::new(db);
        service.set_availability(disabled.id, false).await.unwrap();

        let slots = service.availability(center.id, day).await.unwrap();
        let available = |id: i64| slots.iter().find(|s| s.slot_id == id).unwrap().available;

        assert_eq!(slots.len(), 4);
        assert!(!available(taken.id));
        assert!(!available(disabled.id));
        assert!(available(free.id));
        assert!(available(released.id));
    }
}
