// tests/integration/alert/mod.rs

pub mod visibility_tests;
