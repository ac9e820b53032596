pub mod app;
pub mod auth;
pub mod chat;
pub mod config;
pub mod form;
pub mod notify;
pub mod storage;
