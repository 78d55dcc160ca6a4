// src/processors/mod.rs
pub mod filters;
