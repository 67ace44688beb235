//! protosol-cli
//!
//! Shared pieces of the two binaries:
//!  1) `plugin`, the `protoc` request/response transport behind `protoc-gen-sol`,
//!  2) `logging`, the stderr subscriber both binaries install.

pub mod logging;
pub mod plugin;
