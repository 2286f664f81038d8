use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Hash the default seed password using Argon2id
fn hash_default_password() -> String {
    use argon2::{
        Argon2,
        password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
    };

    let password = b"password";
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password, &salt)
        .expect("Failed to hash default password")
        .to_string()
}

/// Seed permission catalog: explicit ids so the grant rows below can
/// reference them without querying back.
const PERMISSIONS: &[(i32, &str, &str, &str)] = &[
    (1, "dashboard", "read", "Ver dashboard"),
    (2, "users", "read", "Ver usuarios"),
    (3, "users", "create", "Crear usuarios"),
    (4, "users", "update", "Actualizar usuarios"),
    (5, "users", "delete", "Eliminar usuarios"),
    (6, "vehicles", "read", "Ver vehículos"),
    (7, "vehicles", "create", "Crear vehículos"),
    (8, "vehicles", "update", "Actualizar vehículos"),
    (9, "vehicles", "delete", "Eliminar vehículos"),
    (10, "vehicle-entries", "read", "Ver ingresos"),
    (11, "vehicle-entries", "create", "Crear ingresos"),
    (12, "vehicle-entries", "update", "Actualizar ingresos"),
    (13, "vehicle-entries", "delete", "Eliminar ingresos"),
    (14, "work-orders", "read", "Ver órdenes de trabajo"),
    (15, "work-orders", "create", "Crear órdenes de trabajo"),
    (16, "work-orders", "update", "Actualizar órdenes de trabajo"),
    (17, "regions", "read", "Ver regiones"),
    (18, "workshops", "read", "Ver talleres"),
    (19, "roles", "read", "Ver roles"),
    (20, "roles", "update", "Administrar permisos de roles"),
];

const ROLES: &[(i32, &str, &str)] = &[
    (1, "Administrador", "Acceso total al sistema"),
    (2, "Guardia", "Control de acceso vehicular"),
    (3, "Recepcionista", "Gestión de ingresos y órdenes"),
    (4, "Mecánico", "Ejecución de trabajos"),
];

/// `(role_id, permission_id)` grant rows
fn role_grants() -> Vec<(i32, i32)> {
    let mut grants: Vec<(i32, i32)> = (1..=20).map(|p| (1, p)).collect();
    // Guardia: dashboard, vehicle/entry visibility, entry lifecycle, reference data
    grants.extend([1, 6, 10, 11, 12, 17, 18].map(|p| (2, p)));
    // Recepcionista: entries plus work orders and vehicle creation
    grants.extend([1, 6, 7, 10, 11, 12, 14, 15, 16, 17, 18].map(|p| (3, p)));
    // Mecánico: read entries, work on orders
    grants.extend([1, 10, 14, 16].map(|p| (4, p)));
    grants
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(schema.create_table_from_entity(Roles).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(Permissions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(RolePermissions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Users).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Regions).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(Workshops)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(schema.create_table_from_entity(Vehicles).if_not_exists().to_owned())
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(VehicleEntries)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(WorkOrders)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(EntryPhotos)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_table(
                schema
                    .create_table_from_entity(KeyControls)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        // Unique pair constraints the entity derives don't express
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_permissions_resource_action")
                    .table(Permissions)
                    .col(crate::entities::permissions::Column::Resource)
                    .col(crate::entities::permissions::Column::Action)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_role_permissions_pair")
                    .table(RolePermissions)
                    .col(crate::entities::role_permissions::Column::RoleId)
                    .col(crate::entities::role_permissions::Column::PermissionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        let now = chrono::Utc::now().to_rfc3339();

        for (id, name, description) in ROLES {
            let insert = Query::insert()
                .into_table(Roles)
                .columns([
                    crate::entities::roles::Column::Id,
                    crate::entities::roles::Column::Name,
                    crate::entities::roles::Column::Description,
                    crate::entities::roles::Column::CreatedAt,
                ])
                .values_panic([(*id).into(), (*name).into(), (*description).into(), now.clone().into()])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        for (id, resource, action, description) in PERMISSIONS {
            let insert = Query::insert()
                .into_table(Permissions)
                .columns([
                    crate::entities::permissions::Column::Id,
                    crate::entities::permissions::Column::Resource,
                    crate::entities::permissions::Column::Action,
                    crate::entities::permissions::Column::Description,
                    crate::entities::permissions::Column::CreatedAt,
                ])
                .values_panic([
                    (*id).into(),
                    (*resource).into(),
                    (*action).into(),
                    (*description).into(),
                    now.clone().into(),
                ])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        for (role_id, permission_id) in role_grants() {
            let insert = Query::insert()
                .into_table(RolePermissions)
                .columns([
                    crate::entities::role_permissions::Column::RoleId,
                    crate::entities::role_permissions::Column::PermissionId,
                ])
                .values_panic([role_id.into(), permission_id.into()])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        let insert = Query::insert()
            .into_table(Regions)
            .columns([
                crate::entities::regions::Column::Id,
                crate::entities::regions::Column::Name,
                crate::entities::regions::Column::Code,
            ])
            .values_panic([1.into(), "Región Metropolitana".into(), "RM".into()])
            .to_owned();
        manager.exec_stmt(insert).await?;

        let insert = Query::insert()
            .into_table(Workshops)
            .columns([
                crate::entities::workshops::Column::Id,
                crate::entities::workshops::Column::Name,
                crate::entities::workshops::Column::RegionId,
                crate::entities::workshops::Column::Address,
            ])
            .values_panic([1.into(), "Taller Central".into(), 1.into(), "Av. Principal 1234".into()])
            .to_owned();
        manager.exec_stmt(insert).await?;

        let insert = Query::insert()
            .into_table(Vehicles)
            .columns([
                crate::entities::vehicles::Column::Id,
                crate::entities::vehicles::Column::LicensePlate,
                crate::entities::vehicles::Column::Brand,
                crate::entities::vehicles::Column::Model,
                crate::entities::vehicles::Column::RegionId,
                crate::entities::vehicles::Column::Status,
                crate::entities::vehicles::Column::CreatedAt,
            ])
            .values_panic([
                1.into(),
                "ABCD-12".into(),
                "Toyota".into(),
                "Hilux".into(),
                1.into(),
                "active".into(),
                now.clone().into(),
            ])
            .to_owned();
        manager.exec_stmt(insert).await?;

        // Seed users: one admin, one guard (both share the default password)
        let password_hash = hash_default_password();
        for (email, first_name, last_name, role_id) in [
            ("admin@fleetgate.local", "Admin", "Sistema", 1),
            ("guardia@fleetgate.local", "Guardia", "Turno", 2),
        ] {
            let insert = Query::insert()
                .into_table(Users)
                .columns([
                    crate::entities::users::Column::Email,
                    crate::entities::users::Column::PasswordHash,
                    crate::entities::users::Column::FirstName,
                    crate::entities::users::Column::LastName,
                    crate::entities::users::Column::RoleId,
                    crate::entities::users::Column::WorkshopId,
                    crate::entities::users::Column::IsActive,
                    crate::entities::users::Column::CreatedAt,
                    crate::entities::users::Column::UpdatedAt,
                ])
                .values_panic([
                    email.into(),
                    password_hash.clone().into(),
                    first_name.into(),
                    last_name.into(),
                    role_id.into(),
                    1.into(),
                    true.into(),
                    now.clone().into(),
                    now.clone().into(),
                ])
                .to_owned();
            manager.exec_stmt(insert).await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for stmt in [
            Table::drop().table(KeyControls).to_owned(),
            Table::drop().table(EntryPhotos).to_owned(),
            Table::drop().table(WorkOrders).to_owned(),
            Table::drop().table(VehicleEntries).to_owned(),
            Table::drop().table(Vehicles).to_owned(),
            Table::drop().table(Workshops).to_owned(),
            Table::drop().table(Regions).to_owned(),
            Table::drop().table(Users).to_owned(),
            Table::drop().table(RolePermissions).to_owned(),
            Table::drop().table(Permissions).to_owned(),
            Table::drop().table(Roles).to_owned(),
        ] {
            manager.drop_table(stmt).await?;
        }

        Ok(())
    }
}
