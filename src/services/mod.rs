// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod discovery;
pub mod fetcher;
pub mod freshness;
pub mod identity;
pub mod points;
pub mod reconcile;
pub mod swimmer;
pub mod tables;

pub use fetcher::{
    FetchError, Fetcher, HttpTransport, RawResponse, ReqwestTransport, RequestGate, RetryPolicy,
    TransportError, UserAgentPool,
};
pub use freshness::{CacheState, Clock, ManualClock, SystemClock};
pub use swimmer::{SwimmerProfile, SwimmerService, SyncOutcome};
