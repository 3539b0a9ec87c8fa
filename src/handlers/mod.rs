pub mod access;
pub mod captions;
pub mod commands;
