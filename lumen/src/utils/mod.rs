pub use serial_test;
pub use tokio;

pub mod task;
