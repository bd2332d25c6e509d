pub mod config;
pub mod logging;

pub mod rest;
pub mod retry;
