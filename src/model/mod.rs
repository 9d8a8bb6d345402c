pub mod account;
pub mod admin;
pub mod api;
pub mod auth;
pub mod candidate;
pub mod mongodb;
pub mod principal;
pub mod store;
pub mod voter;
