//! dbt project resources consumed by model generation.

pub mod source;
