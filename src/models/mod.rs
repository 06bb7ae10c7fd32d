// src/models/mod.rs

pub mod exam;
pub mod grade;
pub mod question;
pub mod student;
pub mod subject;
