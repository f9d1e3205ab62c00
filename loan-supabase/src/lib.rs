pub mod config;
pub mod gateway;

pub use config::SupabaseConfig;
pub use gateway::SupabaseGateway;
