//! Integration test harness
//!
//! Runs every end-to-end crawl test against wiremock servers.

mod crawl_tests;
