//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! end-to-end against an in-memory `ByteStream`/`BtleBackend`. All tests
//! run on the host (x86_64) with no real hardware required.

mod btle_central_tests;
mod mem_stream;
mod mqtt_client_tests;
mod rpc_tree_tests;
