pub mod prelude;

pub mod entry_photos;
pub mod key_controls;
pub mod permissions;
pub mod refresh_tokens;
pub mod regions;
pub mod role_permissions;
pub mod roles;
pub mod users;
pub mod vehicle_entries;
pub mod vehicles;
pub mod work_orders;
pub mod workshops;
