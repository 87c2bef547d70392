pub use crate::context::{HttpLoader, MangaLoaderContext};
pub use crate::manager::SourceManager;
pub use crate::proxy::{ProxyConfig, ProxyType};
pub use crate::settings::SourceSettings;
pub use kotatsu_lib::prelude::*;
