pub mod artifact;
pub mod build;
pub mod config;
pub mod environment;
pub mod patch;
pub mod pipeline;
pub mod process;
pub mod source;
pub mod store;
pub mod system;
