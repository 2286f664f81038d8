pub use super::entry_photos::Entity as EntryPhotos;
pub use super::key_controls::Entity as KeyControls;
pub use super::permissions::Entity as Permissions;
pub use super::refresh_tokens::Entity as RefreshTokens;
pub use super::regions::Entity as Regions;
pub use super::role_permissions::Entity as RolePermissions;
pub use super::roles::Entity as Roles;
pub use super::users::Entity as Users;
pub use super::vehicle_entries::Entity as VehicleEntries;
pub use super::vehicles::Entity as Vehicles;
pub use super::work_orders::Entity as WorkOrders;
pub use super::workshops::Entity as Workshops;
