pub mod build;
pub mod check;
pub mod common;
pub mod dump;
