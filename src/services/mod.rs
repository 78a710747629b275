pub mod codeblock;
pub mod config;
pub mod discord;
pub mod token_scan;
pub mod utils;
