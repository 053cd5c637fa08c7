//! Unit tests for autoiso
//!
//! These tests use a fake mastering tool and run fast without external I/O
//! beyond temporary directories.

mod architecture;
mod mocks;
