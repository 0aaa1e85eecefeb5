use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub center_id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[schema(value_type = String, example = "2025-11-19")]
    pub appointment_date: Date,
    #[schema(value_type = String, example = "16:20:00")]
    pub appointment_time: Time,
    pub status: String,
    /// See [`AppointmentReason`]
    pub reason: Option<String>,
    #[serde(skip_serializing, default)]
    #[schema(ignore)]
    pub cancel_token: String,
    pub no_show_reported: bool,
    #[sea_orm(column_name = "reminder_3h_sent")]
    pub reminder_3h_sent: bool,
    #[sea_orm(column_name = "reminder_3h_sent_at")]
    #[schema(value_type = Option<String>)]
    pub reminder_3h_sent_at: Option<DateTimeUtc>,
    #[schema(value_type = String)]
    pub created_at: DateTimeUtc,
    #[schema(value_type = String)]
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::center::Entity",
        from = "Column::CenterId",
        to = "super::center::Column::Id",
        on_delete = "SetNull"
    )]
    Center,
}

impl Related<super::center::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Center.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn client_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Parsed status; rows with an unknown status string yield `None`.
    pub fn status(&self) -> Option<AppointmentStatus> {
        AppointmentStatus::parse(&self.status)
    }
}

/// Appointment lifecycle.
///
/// ```text
/// pending ──► confirmed ──► completed
///    │            ├───────► no_show
///    └──► cancelled ◄┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub const ALL: [AppointmentStatus; 5] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(AppointmentStatus::Pending),
            "confirmed" => Some(AppointmentStatus::Confirmed),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" | "canceled" => Some(AppointmentStatus::Cancelled),
            "no_show" => Some(AppointmentStatus::NoShow),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Whether an appointment in this status holds its (center, date, time).
    /// Must agree with the `WHERE status <> 'cancelled'` clause of the partial unique index.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled)
    }

    /// Stored values of the statuses that free their slot, matching the
    /// predicate of `idx_appointments_active_slot`
    pub fn slot_releasing() -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|s| !s.occupies_slot())
            .map(|s| s.as_str())
            .collect()
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Completed)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
        )
    }

    /// Statuses the automatic sweep still has to look at.
    pub fn active() -> [AppointmentStatus; 2] {
        [AppointmentStatus::Pending, AppointmentStatus::Confirmed]
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Administrative ground the appointment is booked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentReason {
    Invalidation,
    Suspension,
    Annulation,
}

impl AppointmentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentReason::Invalidation => "invalidation",
            AppointmentReason::Suspension => "suspension",
            AppointmentReason::Annulation => "annulation",
        }
    }

}
