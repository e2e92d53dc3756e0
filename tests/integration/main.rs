//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters. All tests run on the host with no relay header
//! or panel attached.

mod mock_hw;
mod presence_tests;
