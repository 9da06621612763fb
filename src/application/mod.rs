pub mod app_error;
pub mod jwk;
pub mod jwt;
pub mod use_cases;
