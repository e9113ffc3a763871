pub mod auth;
pub mod categories;
pub mod items;
pub mod quote;
pub mod transfer;
