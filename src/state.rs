use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuditService, AuthService, EntryService, PermissionService, SeaOrmAuditService,
    SeaOrmAuthService, SeaOrmEntryService, SeaOrmPermissionService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,

    pub permission_service: Arc<dyn PermissionService>,

    pub entry_service: Arc<dyn EntryService>,

    pub audit_service: Arc<dyn AuditService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            &config.auth,
            config.security.clone(),
        ));

        let permission_service: Arc<dyn PermissionService> =
            Arc::new(SeaOrmPermissionService::new(store.clone()));

        let entry_service: Arc<dyn EntryService> =
            Arc::new(SeaOrmEntryService::new(store.clone()));

        let audit_service: Arc<dyn AuditService> =
            Arc::new(SeaOrmAuditService::new(store.clone()));

        let config = Arc::new(RwLock::new(config));

        Ok(Self {
            config,
            store,
            auth_service,
            permission_service,
            entry_service,
            audit_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
