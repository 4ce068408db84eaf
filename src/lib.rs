pub mod config;
pub mod error;
pub mod experiment;
pub mod lattice;
pub mod optimizer;
pub mod stats;
// cmd and reports belong to the binary (main.rs).
