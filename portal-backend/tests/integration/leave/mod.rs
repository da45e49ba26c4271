// tests/integration/leave/mod.rs
