use std::{collections::HashMap, sync::Arc};

use fnv::FnvHashMap;
use kotatsu_lib::{
    error::{Error, Result},
    models::MangaSource,
    traits::RemoteMangaRepository,
};

use crate::{context::HttpLoader, settings::SourceSettings, site::DesuMeRepository};

/// Routes requests to the adapter owning a [`MangaSource`]
#[derive(Clone, Default)]
pub struct SourceManager {
    sources: FnvHashMap<MangaSource, Arc<dyn RemoteMangaRepository>>,
}

impl SourceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every bundled adapter, applying the per source settings keyed by [`MangaSource::key`]
    pub fn with_bundled(
        loader: Arc<dyn HttpLoader>,
        settings: &HashMap<String, SourceSettings>,
    ) -> Self {
        let settings_for = |source: MangaSource| {
            settings
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(source.key()))
                .map(|(_, settings)| settings.clone())
                .unwrap_or_default()
        };

        let mut manager = Self::new();
        manager.insert(Arc::new(DesuMeRepository::new(
            loader,
            settings_for(MangaSource::DesuMe),
        )));

        manager
    }

    pub fn insert(&mut self, repo: Arc<dyn RemoteMangaRepository>) {
        debug!("register source {}", repo.source());
        self.sources.insert(repo.source(), repo);
    }

    pub fn get(&self, source: MangaSource) -> Result<Arc<dyn RemoteMangaRepository>> {
        self.sources
            .get(&source)
            .cloned()
            .ok_or_else(|| Error::InvalidArgument(format!("source {source} not exists")))
    }

    pub fn list(&self) -> Vec<MangaSource> {
        let mut sources = self.sources.keys().copied().collect::<Vec<_>>();
        sources.sort();
        sources
    }
}
