//! Integration tests for the autoiso CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! They are slower and should be run separately from unit tests.

mod build_command;
mod cli_tests;
