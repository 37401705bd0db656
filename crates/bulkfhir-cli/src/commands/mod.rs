pub mod fetch;
pub mod local;
pub mod types;
