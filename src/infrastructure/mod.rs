pub mod cache;
pub mod container;
pub mod database;
pub mod external_services;
