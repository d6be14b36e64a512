pub mod contract;
pub mod evaluation;
