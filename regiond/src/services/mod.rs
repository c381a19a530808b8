//! Service layer for regiond

pub mod coordinator;
pub mod directory_client;
pub mod scheduler;
pub mod sync_engine;
