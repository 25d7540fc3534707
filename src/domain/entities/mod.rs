pub mod checkpoint;
pub mod holding;
pub mod investor;
pub mod match_result;
