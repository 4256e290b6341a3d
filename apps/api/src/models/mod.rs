pub mod company;
pub mod connection;
pub mod evaluation;
pub mod message;
pub mod shared_list;
pub mod user;
