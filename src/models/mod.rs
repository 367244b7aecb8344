//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains all request/response structures used by the API.

pub mod bonus;

// Re-export commonly used types
pub use bonus::*;
