pub mod period;
pub mod station;
