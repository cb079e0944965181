//! Test suites for the daemon request pipeline.

mod support;
