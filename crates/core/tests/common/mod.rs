//! Shared helpers for core tests.
