pub mod config;
pub mod db;
pub mod errors;
pub mod generation;
pub mod image_client;
pub mod llm_client;
pub mod models;
pub mod records;
pub mod state;
pub mod storage;
pub mod watermark;
