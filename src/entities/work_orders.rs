use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Owned exclusively by one vehicle entry; purged with it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "work_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub entry_id: i32,

    #[sea_orm(unique)]
    pub order_number: String,

    pub description: String,

    pub status: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle_entries::Entity",
        from = "Column::EntryId",
        to = "super::vehicle_entries::Column::Id"
    )]
    Entry,
}

impl Related<super::vehicle_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entry.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
