pub mod config;
pub mod profile;
pub mod storage;
pub mod wait;
