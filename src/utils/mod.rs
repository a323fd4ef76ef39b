pub mod error;
pub mod logger;
pub mod token;
pub mod validation;
