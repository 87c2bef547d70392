use std::future::Future;

use futures::{
    future,
    stream::{self, BoxStream},
    StreamExt,
};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};

const CHANNEL_CAPACITY: usize = 64;

/// Publishes the name of every table a repository writes to.
///
/// Observers re-run their query on any write to a watched table, whether or
/// not the rows they select actually changed.
#[derive(Debug, Clone)]
pub struct InvalidationTracker {
    tx: broadcast::Sender<&'static str>,
}

impl Default for InvalidationTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InvalidationTracker {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn notify(&self, table: &'static str) {
        trace!("table {table} invalidated");
        // no receivers is fine, nobody observes right now
        let _ = self.tx.send(table);
    }

    pub fn notify_all(&self, tables: &[&'static str]) {
        for table in tables {
            self.notify(table);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<&'static str> {
        self.tx.subscribe()
    }

    /// Emits `query()` once right away and again after every write to one of
    /// `tables`. Dropping the stream unsubscribes.
    pub fn observe<T, E, F, Fut>(
        &self,
        tables: &'static [&'static str],
        query: F,
    ) -> BoxStream<'static, Result<T, E>>
    where
        T: Send + 'static,
        E: Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        // subscribe before the first query so no write in between is lost
        let changes = BroadcastStream::new(self.subscribe()).filter(move |change| {
            future::ready(match change {
                Ok(table) => tables.contains(table),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    debug!("observer lagged behind by {skipped} changes, querying again");
                    true
                }
            })
        });

        stream::once(future::ready(()))
            .chain(changes.map(|_| ()))
            .then(move |_| query())
            .boxed()
    }
}
