pub mod api;
pub mod config;
pub mod db;
pub mod inference;
pub mod intake;
pub mod models;
pub mod storage;
