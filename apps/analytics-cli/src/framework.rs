pub mod dbt;
pub mod python;
