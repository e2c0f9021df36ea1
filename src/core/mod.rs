pub mod auth;
pub mod client;
pub mod config;
pub mod decode;
pub mod merge;
pub mod options;
