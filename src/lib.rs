pub mod common;
pub mod config;
pub mod db;
pub mod processors;
pub mod server_args;
pub mod utils;
