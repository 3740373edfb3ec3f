/// Kvdrive library - exposes modules for testing and external use.
pub mod error;
pub mod keys;
pub mod output;
pub mod protocol;
pub mod report;
pub mod simulator;
pub mod target;
pub mod transport;
