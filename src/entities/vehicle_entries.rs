use sea_orm::entity::prelude::*;

/// One physical visit of a vehicle to a workshop.
///
/// `status` is the canonical lifecycle representation; `exit_date` is written
/// by the same statement that flips `status` to `salida`, so
/// `status = ingresado` always implies `exit_date IS NULL`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "vehicle_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub entry_code: String,

    pub vehicle_id: i32,

    pub workshop_id: i32,

    pub driver_name: String,

    pub driver_rut: Option<String>,

    pub entry_date: String,

    pub exit_date: Option<String>,

    /// `ingresado` (open) or `salida` (closed, terminal).
    pub status: String,

    pub created_by_id: i32,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicles::Entity",
        from = "Column::VehicleId",
        to = "super::vehicles::Column::Id"
    )]
    Vehicle,
    #[sea_orm(
        belongs_to = "super::workshops::Entity",
        from = "Column::WorkshopId",
        to = "super::workshops::Column::Id"
    )]
    Workshop,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CreatedById",
        to = "super::users::Column::Id"
    )]
    CreatedBy,
    #[sea_orm(has_many = "super::work_orders::Entity")]
    WorkOrders,
    #[sea_orm(has_many = "super::entry_photos::Entity")]
    Photos,
    #[sea_orm(has_one = "super::key_controls::Entity")]
    KeyControl,
}

impl Related<super::vehicles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl Related<super::workshops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Workshop.def()
    }
}

impl Related<super::work_orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkOrders.def()
    }
}

impl Related<super::entry_photos::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Photos.def()
    }
}

impl Related<super::key_controls::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KeyControl.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
