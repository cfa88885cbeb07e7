//! Integration test suite.
//!
//! The `session`, `records` and `queries` modules run against local mock
//! servers. The `live` tests need a real server and are ignored by default:
//!   BPM_URL=... BPM_LOGIN=... BPM_PASSWORD=... cargo test --test integration -- --ignored --nocapture

#[path = "integration/common.rs"]
mod common;
#[path = "integration/live.rs"]
mod live;
#[path = "integration/queries.rs"]
mod queries;
#[path = "integration/records.rs"]
mod records;
#[path = "integration/session.rs"]
mod session;
