//! Seagrape Sync - Client-side offline-first synchronization engine.
//!
//! The engine keeps the storefront usable while the network is down and
//! reconciles state once it returns. It is built from four pieces:
//!
//! - [`cache`] - named, versioned buckets of cached responses with
//!   per-resource-class population policy
//! - [`router`] - the interception layer: every outgoing request is
//!   classified once and dispatched to exactly one caching strategy
//! - [`store`] - a durable, ordered log of mutations issued while offline,
//!   surviving process restarts
//! - [`queue`] - the mutation queue manager: enqueues offline mutations and
//!   drains them in FIFO order when connectivity returns
//!
//! # Architecture
//!
//! All state lives in explicit service objects with constructor-injected
//! collaborators; there are no module-level singletons. The network is
//! reached only through the [`net::HttpBackend`] trait, so tests drive the
//! whole engine against a scripted backend. All I/O is asynchronous; nothing
//! blocks the caller, and background replay logs and continues on per-item
//! failure.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod error;
pub mod net;
pub mod queue;
pub mod request;
pub mod response;
pub mod router;
pub mod store;

pub use cache::{BucketNames, ResourceCache};
pub use error::{NetworkError, StoreError};
pub use net::{HttpBackend, OutboundRequest, ReqwestBackend};
pub use queue::{DrainReport, MutationQueue, spawn_worker};
pub use request::{FetchRequest, RequestClass, RequestIdentity, RequestMode, classify};
pub use response::{FetchResponse, ResponseSource};
pub use router::{FetchRouter, RouterConfig};
pub use store::{OperationStore, QueuedOperation};
