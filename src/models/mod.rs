pub mod admin;
pub mod employee;
