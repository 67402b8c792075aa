#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Access control for the watch-list store.
//!
//! Every repository operation carries a [`PermissionRules`] entry naming the
//! least [`PermissionMode`] a caller needs. [`check_permission`] compares the
//! caller's mode against that rule and reports refusals as
//! [`PermissionDenied`], keyed by the caller's mode. `NoOne` refuses
//! everybody; `Anyone` marks trusted internal callers.
//!
//! [`CallerContext`] carries the authenticated caller through a request.

pub mod context;
pub mod permission;

pub use context::CallerContext;
pub use permission::{
    Operation, PERMISSION_ERROR_TYPE, PermissionDenied, PermissionMode, PermissionRules,
    check_permission,
};
