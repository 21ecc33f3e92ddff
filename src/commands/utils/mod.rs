// src/commands/utils/mod.rs
pub mod archive;
