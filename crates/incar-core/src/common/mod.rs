pub mod elements;
pub mod tables;
