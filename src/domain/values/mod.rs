pub mod checkpoint_status;
pub mod cusip;
pub mod exposure;
pub mod filing_quarter;
pub mod normalization_mode;
pub mod product_mapping;
