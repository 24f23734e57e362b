pub mod backend;
pub mod log;
pub mod noop;
