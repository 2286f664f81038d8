use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::entities::{permissions, refresh_tokens, regions, roles, vehicles, workshops};

pub mod migrator;
pub mod repositories;

pub use repositories::audit::{Finding, Inconsistency};
pub use repositories::entry::{
    AttachOutcome, CloseOutcome, DashboardRow, EntryDetail, EntryFilter, NewEntry, OpenOutcome,
};
pub use repositories::role::GrantOutcome;
pub use repositories::user::User;
pub use repositories::vehicle::CreateVehicleOutcome;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn role_repo(&self) -> repositories::role::RoleRepository {
        repositories::role::RoleRepository::new(self.conn.clone())
    }

    fn refresh_token_repo(&self) -> repositories::refresh_token::RefreshTokenRepository {
        repositories::refresh_token::RefreshTokenRepository::new(self.conn.clone())
    }

    fn vehicle_repo(&self) -> repositories::vehicle::VehicleRepository {
        repositories::vehicle::VehicleRepository::new(self.conn.clone())
    }

    fn entry_repo(&self) -> repositories::entry::EntryRepository {
        repositories::entry::EntryRepository::new(self.conn.clone())
    }

    fn audit_repo(&self) -> repositories::audit::AuditRepository {
        repositories::audit::AuditRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn touch_user_last_login(&self, id: i32) -> Result<()> {
        self.user_repo().touch_last_login(id).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        config: Option<&crate::config::SecurityConfig>,
    ) -> Result<()> {
        self.user_repo().update_password(id, new_password, config).await
    }

    // ========== Roles & permissions ==========

    pub async fn get_role(&self, role_id: i32) -> Result<Option<roles::Model>> {
        self.role_repo().get(role_id).await
    }

    pub async fn list_roles(&self) -> Result<Vec<roles::Model>> {
        self.role_repo().list().await
    }

    pub async fn permission_catalog(&self) -> Result<Vec<permissions::Model>> {
        self.role_repo().permission_catalog().await
    }

    pub async fn role_permission_pairs(&self, role_id: i32) -> Result<HashSet<(String, String)>> {
        self.role_repo().permission_pairs(role_id).await
    }

    pub async fn role_granted_permissions(&self, role_id: i32) -> Result<Vec<permissions::Model>> {
        self.role_repo().granted_permissions(role_id).await
    }

    pub async fn grant_permission(&self, role_id: i32, permission_id: i32) -> Result<GrantOutcome> {
        self.role_repo().grant(role_id, permission_id).await
    }

    pub async fn revoke_permission(&self, role_id: i32, permission_id: i32) -> Result<bool> {
        self.role_repo().revoke(role_id, permission_id).await
    }

    // ========== Refresh tokens ==========

    pub async fn store_refresh_token(
        &self,
        user_id: i32,
        token: &str,
        expires_at: &str,
    ) -> Result<()> {
        self.refresh_token_repo().insert(user_id, token, expires_at).await
    }

    pub async fn consume_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<refresh_tokens::Model>> {
        self.refresh_token_repo().consume(token).await
    }

    pub async fn revoke_user_refresh_tokens(&self, user_id: i32) -> Result<u64> {
        self.refresh_token_repo().revoke_all_for_user(user_id).await
    }

    pub async fn prune_expired_refresh_tokens(&self, now: &str) -> Result<u64> {
        self.refresh_token_repo().prune_expired(now).await
    }

    // ========== Vehicles & reference data ==========

    pub async fn create_vehicle(
        &self,
        license_plate: &str,
        brand: &str,
        model: &str,
        region_id: i32,
    ) -> Result<CreateVehicleOutcome> {
        self.vehicle_repo()
            .create(license_plate, brand, model, region_id)
            .await
    }

    pub async fn get_vehicle(&self, id: i32) -> Result<Option<vehicles::Model>> {
        self.vehicle_repo().get(id).await
    }

    pub async fn list_vehicles(
        &self,
    ) -> Result<Vec<(vehicles::Model, Option<regions::Model>)>> {
        self.vehicle_repo().list().await
    }

    pub async fn list_regions(&self) -> Result<Vec<regions::Model>> {
        self.vehicle_repo().list_regions().await
    }

    pub async fn list_workshops(&self) -> Result<Vec<workshops::Model>> {
        self.vehicle_repo().list_workshops().await
    }

    // ========== Vehicle entries ==========

    pub async fn open_entry(&self, input: NewEntry) -> Result<OpenOutcome> {
        self.entry_repo().open(input).await
    }

    pub async fn close_entry(&self, entry_id: i32) -> Result<CloseOutcome> {
        self.entry_repo().close(entry_id).await
    }

    pub async fn attach_work_order(
        &self,
        entry_id: i32,
        description: &str,
    ) -> Result<AttachOutcome<crate::entities::work_orders::Model>> {
        self.entry_repo().attach_work_order(entry_id, description).await
    }

    pub async fn attach_entry_photo(
        &self,
        entry_id: i32,
        url: &str,
        description: Option<&str>,
    ) -> Result<AttachOutcome<crate::entities::entry_photos::Model>> {
        self.entry_repo().attach_photo(entry_id, url, description).await
    }

    pub async fn set_key_control(
        &self,
        entry_id: i32,
        key_location: &str,
        delivered_to: Option<&str>,
    ) -> Result<AttachOutcome<crate::entities::key_controls::Model>> {
        self.entry_repo()
            .set_key_control(entry_id, key_location, delivered_to)
            .await
    }

    pub async fn get_entry_detail(&self, entry_id: i32) -> Result<Option<EntryDetail>> {
        self.entry_repo().get_detail(entry_id).await
    }

    pub async fn list_entries(
        &self,
        filter: &EntryFilter,
    ) -> Result<(
        Vec<(crate::entities::vehicle_entries::Model, Option<vehicles::Model>)>,
        u64,
    )> {
        self.entry_repo().list(filter).await
    }

    pub async fn active_entries(
        &self,
    ) -> Result<Vec<(crate::entities::vehicle_entries::Model, Option<vehicles::Model>)>> {
        self.entry_repo().active().await
    }

    pub async fn dashboard_rows(&self) -> Result<Vec<DashboardRow>> {
        self.entry_repo().dashboard_rows().await
    }

    // ========== Auditor ==========

    pub async fn find_inconsistent_entries(&self) -> Result<(u64, Vec<Finding>)> {
        self.audit_repo().find_inconsistent().await
    }

    pub async fn purge_entry(&self, entry_id: i32) -> Result<u64> {
        self.audit_repo().purge(entry_id).await
    }
}
