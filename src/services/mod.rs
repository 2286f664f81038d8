pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{
    AuthError, AuthService, Claims, LoginResult, Principal, TokenPair, UserInfo,
};
pub use auth_service_impl::SeaOrmAuthService;

pub mod permission_service;
pub mod permission_service_impl;
pub use permission_service::{
    Decision, DenyReason, GrantResult, PermissionError, PermissionService,
};
pub use permission_service_impl::SeaOrmPermissionService;

pub mod entry_service;
pub mod entry_service_impl;
pub use entry_service::{
    DashboardStats, EntryDetailInfo, EntryError, EntryInfo, EntryListQuery, EntryPage,
    EntryService, OpenEntryInput,
};
pub use entry_service_impl::SeaOrmEntryService;

pub mod audit_service;
pub mod audit_service_impl;
pub use audit_service::{AuditError, AuditFinding, AuditReport, AuditService};
pub use audit_service_impl::SeaOrmAuditService;
