// src/handlers/mod.rs

pub mod admin;
pub mod auth;
pub mod confidence;
pub mod lecture;
pub mod profile;
pub mod quiz;
pub mod results;
pub mod thread;
