// src/exam/mod.rs

//! The exam session state machine: an attempt moves from NotStarted to
//! InProgress on `start` and ends in Finalized, which is terminal.

pub mod engine;
pub mod memory;
pub mod postgres;
pub mod scoring;
pub mod session;
pub mod store;

pub use engine::{ExamEngine, ExamStep};
pub use memory::MemoryStore;
pub use postgres::PgExamStore;
pub use session::ExamSession;
pub use store::ExamStore;
