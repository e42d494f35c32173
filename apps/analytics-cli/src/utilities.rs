pub mod constants;
pub mod identifiers;
pub mod retry;
