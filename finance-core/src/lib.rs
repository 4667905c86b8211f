pub mod error;
pub mod observability;

pub use error::AppError;
