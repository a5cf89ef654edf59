//! HTTP handler modules for recall-api.

pub mod highlights;
pub mod review;
