pub mod health;
pub mod liveness;

pub use health::health_handler;
pub use liveness::test_handler;
