pub mod auth;
pub mod crm;
pub mod inventory;
pub mod tenancy;
pub mod update;
