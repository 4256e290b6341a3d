pub mod handlers;
pub mod service;
pub mod visibility;
