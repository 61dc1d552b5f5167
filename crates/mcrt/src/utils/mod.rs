pub mod atomic;
pub mod counter;
pub mod log_once;
pub mod progress;
pub mod timer;
