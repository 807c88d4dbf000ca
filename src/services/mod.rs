// src/services/mod.rs
pub mod generation;
pub mod session_router;
pub mod session_store;
