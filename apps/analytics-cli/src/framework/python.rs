//! Python code generation: SQLModel classes, polyfactory factories and the package files
//! that tie them together.

pub mod factory;
pub mod files;
pub mod naming;
pub mod sqlmodel;
