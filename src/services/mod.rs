pub mod file_types;
pub mod file_validator;
pub mod generation;
pub mod generative;
pub mod health;
pub mod rate_limiter;
