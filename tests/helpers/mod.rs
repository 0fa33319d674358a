// Test helper modules
pub mod test_harness;
pub mod test_utils;

pub use test_harness::TestHarness;
