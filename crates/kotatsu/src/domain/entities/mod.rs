pub mod suggestion;
pub mod tag;
