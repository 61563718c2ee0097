pub mod auth;
pub mod customer;
pub mod health;
pub mod manager;
pub mod pharmacist;
