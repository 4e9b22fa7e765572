// tests/property/mod.rs

mod scheduler;
