pub mod audit;
pub mod entry;
pub mod refresh_token;
pub mod role;
pub mod user;
pub mod vehicle;
