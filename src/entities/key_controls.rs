use sea_orm::entity::prelude::*;
use serde::Serialize;

/// Key custody record. Exactly one per entry (`entry_id` is unique);
/// purged with the entry.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "key_controls")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub entry_id: i32,

    pub key_location: String,

    pub delivered_to: Option<String>,

    pub created_at: String,

    pub updated_at: String,
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
