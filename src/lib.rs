pub mod backend;
pub mod blob;
pub mod cache;
pub mod config;
pub mod errors;
pub mod form;
pub mod health;
pub mod model;
pub mod render;
pub mod service;
pub mod session;
pub mod validation;
pub mod views;

#[cfg(test)]
mod testing;
