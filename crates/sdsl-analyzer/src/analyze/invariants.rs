//! Invariant checks excluded from coverage reports.

#![cfg_attr(coverage_nightly, coverage(off))]

use super::scope::ScopeStack;

/// Builtin, group and module scopes stay; everything pushed while visiting
/// the shader must have been popped.
#[inline]
pub fn assert_scopes_unwound(scopes: &ScopeStack) {
    assert_eq!(
        scopes.depth(),
        3,
        "analyzer: method or block scope left open after visiting the shader"
    );
}
