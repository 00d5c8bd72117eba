pub mod response;
pub mod stats;

pub use response::*;
pub use stats::*;
