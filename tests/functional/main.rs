// Test code is allowed to panic on failure
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]

//! Functional tests for the EtcdCluster reconcile flow.
//!
//! These tests drive the production reconcile logic against a recorded
//! in-memory store, WITHOUT requiring a live Kubernetes cluster. The store
//! implements the same access seam the controller uses, so the read-or-create
//! ordering, condition lifecycle, and status finalization under test are the
//! real implementations.
//!
//! ```bash
//! # Run all functional tests
//! cargo test --test functional
//!
//! # Run specific test
//! cargo test --test functional test_first_reconcile_creates_all_objects
//! ```

mod mock_store;
mod reconcile_tests;
