pub mod email;
pub mod identity;
pub mod modules;
pub mod query;
pub mod registration;
pub mod user;
