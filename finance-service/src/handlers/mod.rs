pub mod documents;
pub mod health;
pub mod recurring;
pub mod sequences;
