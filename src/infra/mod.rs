//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains I/O-performing adapters: process execution and the
//! YAML-backed configuration and profile stores.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod profile;
