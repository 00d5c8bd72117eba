pub mod stats;
pub mod umami;

pub use stats::StatsService;
pub use umami::{StatsSource, UmamiClient};

#[cfg(test)]
pub(crate) mod testing;
