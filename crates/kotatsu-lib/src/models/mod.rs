pub mod source;
pub use source::*;

pub mod manga;
pub use manga::*;

pub mod chapter;
pub use chapter::*;

pub mod page;
pub use page::*;

pub mod tag;
pub use tag::*;

pub mod sort_order;
pub use sort_order::*;
