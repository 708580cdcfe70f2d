pub mod chat;
pub mod config;
pub mod evaluation;
pub mod llm;
pub mod models;
pub mod persona;
pub mod service;
pub mod telemetry;

pub use config::{Config, ConfigError};
pub use llm::{GeminiModelClient, ModelClient, ModelError};
pub use models::*;
pub use service::{AppState, build_router};
