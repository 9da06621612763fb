pub mod directory;
pub mod email;
pub mod http;
pub mod jwks;
pub mod persistence;
