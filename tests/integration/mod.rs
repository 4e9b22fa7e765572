// tests/integration/mod.rs

mod config_loading;
mod shell_executor;
mod simulated_executor;
