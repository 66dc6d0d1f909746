pub mod backends;
pub mod publishers;
