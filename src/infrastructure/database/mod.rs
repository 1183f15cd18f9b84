pub mod connection;
pub mod executor;
pub mod introspection;
