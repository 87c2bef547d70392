use std::hash::Hasher;

use fnv::FnvHasher;

use crate::models::MangaSource;

/// Derives a stable identifier from a site's native numeric id.
///
/// The same `(source, id)` pair always yields the same value, across fetches
/// and across processes, so it can be persisted and compared.
pub fn generate_uid(source: MangaSource, id: i64) -> i64 {
    let mut hasher = FnvHasher::default();
    hasher.write(source.key().as_bytes());
    hasher.write_i64(id);
    hasher.finish() as i64
}

/// Same as [`generate_uid`] for sites keyed by strings (tags, slugs).
pub fn generate_uid_str(source: MangaSource, key: &str) -> i64 {
    let mut hasher = FnvHasher::default();
    hasher.write(source.key().as_bytes());
    hasher.write(key.as_bytes());
    hasher.finish() as i64
}
