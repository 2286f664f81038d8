use sea_orm::entity::prelude::*;

/// A workshop belongs to exactly one region.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "workshops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub region_id: i32,

    pub address: Option<String>,
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
