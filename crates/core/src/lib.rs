#![forbid(unsafe_code)]

pub mod bank;
pub mod error;
pub mod model;

pub use bank::QuestionBank;
pub use error::Error;
