use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A physical service center. Reference data: looked up, never edited by the booking flow.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, utoipa::ToSchema)]
#[sea_orm(table_name = "centers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub city: String,
    pub address: String,
    /// IANA zone name; falls back to the configured default when absent
    pub timezone: Option<String>,
    pub is_active: bool,
    #[schema(value_type = String)]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::slot::Entity")]
    Slots,
    #[sea_orm(has_many = "super::appointment::Entity")]
    Appointments,
}

impl Related<super::slot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Slots.def()
    }
}

impl Related<super::appointment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appointments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
