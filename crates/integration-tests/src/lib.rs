//! Integration tests for Seagrape.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p seagrape-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `offline_engine` - end-to-end sync engine scenarios (cache, router,
//!   queue) against the scripted storefront in [`support`]
//! - `checkout_plan` - order commit plan invariants
//! - `order_state_machine` - order status transition legality
//!
//! The tests are hermetic: the network is the scripted backend below and
//! the durable store is a temporary sled database. No live services.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod support;
