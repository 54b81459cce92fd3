pub mod progress;
pub mod user;
pub mod words;
