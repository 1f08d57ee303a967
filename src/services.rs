pub mod auth;
pub mod crm_service;
pub mod inventory_service;
pub mod tenancy_service;
