//! Common module containing shared utilities and types

pub mod task;

pub use task::Task;
