//! Common test utilities for fileconvert integration tests

#[allow(dead_code)]
pub mod api;
#[allow(dead_code)]
pub mod notify;

#[allow(unused_imports)]
pub use api::*;
#[allow(unused_imports)]
pub use notify::*;
