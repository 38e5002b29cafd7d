//! Session, authorization and decoding core

pub mod authorizer;
pub mod config;
pub mod credentials;
pub mod decoder;
pub mod document;
pub mod errors;
pub mod models;
pub mod request;
pub mod session;
pub mod transport;
