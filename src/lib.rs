pub mod config;
pub mod driver;
pub mod exercise;
pub mod pose;
pub mod recorder;
pub mod render;
pub mod session;
pub mod source;
