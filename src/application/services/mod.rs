//! Use-case services built on the ports.

pub mod config_service;
