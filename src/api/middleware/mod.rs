pub mod metrics;
pub mod multipart;
pub mod rate_limit;
pub mod request_id;
pub mod sanitize;
