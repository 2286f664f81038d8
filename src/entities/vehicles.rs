use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub license_plate: String,

    pub brand: String,

    pub model: String,

    pub region_id: i32,

    /// `active` or `in_maintenance`; flipped together with the entry
    /// lifecycle inside the same transaction.
    pub status: String,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::regions::Entity",
        from = "Column::RegionId",
        to = "super::regions::Column::Id"
    )]
    Region,
    #[sea_orm(has_many = "super::vehicle_entries::Entity")]
    VehicleEntries,
}

impl Related<super::regions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Region.def()
    }
}

impl Related<super::vehicle_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VehicleEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
