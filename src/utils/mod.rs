// src/utils/mod.rs

pub mod credentials;
pub mod html;
pub mod jwt;
