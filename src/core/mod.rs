pub mod debounce;
pub mod engine;
pub mod filter;
pub mod types;
