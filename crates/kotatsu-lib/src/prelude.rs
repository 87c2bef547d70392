pub use crate::error::{Error, Result};
pub use crate::models::*;
pub use crate::traits::RemoteMangaRepository;
pub use crate::uid::{generate_uid, generate_uid_str};
