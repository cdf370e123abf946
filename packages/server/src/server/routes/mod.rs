// HTTP routes
pub mod health;
pub mod solve;

pub use health::*;
pub use solve::*;
