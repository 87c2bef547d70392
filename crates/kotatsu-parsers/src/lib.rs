#[macro_use]
extern crate log;

pub mod context;
pub mod manager;
pub mod prelude;
pub mod proxy;
pub mod settings;
pub mod site;
