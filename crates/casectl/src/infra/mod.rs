pub mod build;
pub mod config;
pub mod console;
pub mod document;
pub mod exec;
pub mod paths;
pub mod store;
