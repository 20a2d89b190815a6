//! Route handlers organized by resource

pub mod health;
pub mod users;
pub mod dreams;
pub mod comments;
pub mod fulfill;
