pub mod about;
pub mod upload;
