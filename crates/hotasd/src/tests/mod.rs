//! Test suites for the hotasd daemon.

pub(crate) mod support;
