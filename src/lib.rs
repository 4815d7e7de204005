pub mod analysis;
pub mod capture;
pub mod coaching;
pub mod common;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod pipeline;

pub use coaching::{Coach, CoachingUpdate, SessionReport, Tip};
pub use config::Configuration;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::AppError;
