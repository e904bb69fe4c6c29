pub mod conflict;
pub mod utilization;
