//! Resumen Nómina CLI — terminal front-end for the payroll summary dashboard.

pub mod render;
pub mod repl;
