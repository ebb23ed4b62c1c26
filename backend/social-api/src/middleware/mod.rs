pub mod authorization;
pub mod error_handling;
pub mod guards;
