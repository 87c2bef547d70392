pub mod manga;
pub mod suggestion;
