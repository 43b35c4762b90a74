pub mod config;
pub mod persona;
