//! Per-level routing of records to an encoder and a writer
//!
//! Every [`Level`] owns an (encoder, writer) pair that can be replaced at
//! any time. Lookups hand out cloned `Arc`s, so a caller that resolved a
//! pair before a reconfiguration finishes its write on the old pair; the
//! old writer is only dropped once the last such caller is done.

use crate::{Encoder, Level, Writer};
use parking_lot::RwLock;
use std::io;
use std::sync::Arc;

/// The pair a level resolves to
#[derive(Clone)]
pub struct Route {
    /// Encoder for records at this level
    pub encoder: Arc<dyn Encoder>,
    /// Writer receiving the encoded bytes
    pub writer: Arc<dyn Writer>,
}

/// Level -> (encoder, writer) table, safe under concurrent lookup and update
pub struct LevelDispatchTable {
    routes: RwLock<[Route; Level::COUNT]>,
}

impl LevelDispatchTable {
    /// Route every level to `encoder` and `writer`
    pub fn new(encoder: Arc<dyn Encoder>, writer: Arc<dyn Writer>) -> Self {
        let route = Route { encoder, writer };
        Self {
            routes: RwLock::new(std::array::from_fn(|_| route.clone())),
        }
    }

    /// Resolve the pair for `level`
    #[inline]
    pub fn of(&self, level: Level) -> Route {
        self.routes.read()[level.index()].clone()
    }

    /// Resolve a level by name; unknown names use the most severe level's pair
    pub fn of_name(&self, name: &str) -> Route {
        let level = name.parse().unwrap_or(Level::MOST_SEVERE);
        self.of(level)
    }

    /// Replace the encoder of one level
    pub fn set_encoder(&self, level: Level, encoder: Arc<dyn Encoder>) {
        self.routes.write()[level.index()].encoder = encoder;
    }

    /// Replace the encoder of every level
    pub fn set_all_encoders(&self, encoder: Arc<dyn Encoder>) {
        for route in self.routes.write().iter_mut() {
            route.encoder = encoder.clone();
        }
    }

    /// Replace the writer of one level
    pub fn set_writer(&self, level: Level, writer: Arc<dyn Writer>) {
        self.routes.write()[level.index()].writer = writer;
    }

    /// Replace the writer of every level
    pub fn set_all_writers(&self, writer: Arc<dyn Writer>) {
        for route in self.routes.write().iter_mut() {
            route.writer = writer.clone();
        }
    }

    /// Replace both halves of one level's pair at once
    pub fn set(&self, level: Level, encoder: Arc<dyn Encoder>, writer: Arc<dyn Writer>) {
        self.routes.write()[level.index()] = Route { encoder, writer };
    }

    /// Every distinct writer currently routed to, in level order
    pub fn writers(&self) -> Vec<Arc<dyn Writer>> {
        let routes = self.routes.read();
        let mut writers: Vec<Arc<dyn Writer>> = Vec::with_capacity(routes.len());
        for route in routes.iter() {
            if !writers.iter().any(|w| same_writer(w, &route.writer)) {
                writers.push(route.writer.clone());
            }
        }
        writers
    }

    /// Flush every distinct writer once
    ///
    /// All writers are attempted; the first error is returned.
    pub fn sync(&self) -> io::Result<()> {
        first_error(self.writers().iter().map(|w| w.flush()))
    }

    /// Close every distinct writer once
    pub fn close(&self) -> io::Result<()> {
        first_error(self.writers().iter().map(|w| w.close()))
    }
}

impl std::fmt::Debug for LevelDispatchTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelDispatchTable")
            .field("writers", &self.writers().len())
            .finish_non_exhaustive()
    }
}

fn same_writer(a: &Arc<dyn Writer>, b: &Arc<dyn Writer>) -> bool {
    // Compare data pointers only; vtable pointers can differ per codegen unit
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn first_error(results: impl Iterator<Item = io::Result<()>>) -> io::Result<()> {
    let mut first = Ok(());
    for result in results {
        if first.is_ok() {
            first = result;
        }
    }
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingWriter, MemoryWriter};
    use crate::{Record, TextEncoder};

    fn table_with(writer: MemoryWriter) -> LevelDispatchTable {
        LevelDispatchTable::new(Arc::new(TextEncoder::new()), Arc::new(writer))
    }

    #[test]
    fn test_every_level_resolves() {
        let sink = MemoryWriter::new();
        let table = table_with(sink.clone());

        for level in Level::ALL {
            table.of(level).writer.write(level.as_str().as_bytes()).unwrap();
        }

        assert_eq!(sink.text(), "TRACEDEBUGINFOWARNERROR");
    }

    #[test]
    fn test_set_writer_for_one_level() {
        let all = MemoryWriter::new();
        let errors = MemoryWriter::new();
        let table = table_with(all.clone());

        table.set_writer(Level::Error, Arc::new(errors.clone()));

        table.of(Level::Info).writer.write(b"info").unwrap();
        table.of(Level::Error).writer.write(b"error").unwrap();

        assert_eq!(all.text(), "info");
        assert_eq!(errors.text(), "error");
    }

    #[test]
    fn test_unknown_name_falls_back_to_most_severe() {
        let table = table_with(MemoryWriter::new());
        let errors = MemoryWriter::new();
        table.set_writer(Level::Error, Arc::new(errors.clone()));

        table.of_name("print").writer.write(b"x").unwrap();
        table.of_name("WARN").writer.write(b"-").unwrap();

        assert_eq!(errors.text(), "x");
    }

    #[test]
    fn test_in_flight_route_survives_swap() {
        let old = MemoryWriter::new();
        let new = MemoryWriter::new();
        let table = table_with(old.clone());

        let route = table.of(Level::Info);
        table.set_all_writers(Arc::new(new.clone()));
        route.writer.write(b"late").unwrap();

        assert_eq!(old.text(), "late");
        assert!(new.contents().is_empty());
    }

    #[test]
    fn test_set_encoder_per_level() {
        let table = table_with(MemoryWriter::new());
        table.set_encoder(
            Level::Debug,
            Arc::new(|r: &Record<'_>, buf: &mut Vec<u8>| {
                buf.extend_from_slice(r.message.as_bytes());
                Ok::<(), crate::Error>(())
            }),
        );

        let record = Record::new(Level::Debug, "raw");
        let mut buf = Vec::new();
        table.of(Level::Debug).encoder.encode(&record, &mut buf).unwrap();
        assert_eq!(buf, b"raw");

        buf.clear();
        table.of(Level::Info).encoder.encode(&record, &mut buf).unwrap();
        assert!(buf.ends_with(b" raw\n"));
    }

    #[test]
    fn test_sync_visits_each_writer_once() {
        let shared = MemoryWriter::new();
        let errors = MemoryWriter::new();
        let table = table_with(shared.clone());
        table.set_writer(Level::Error, Arc::new(errors.clone()));

        assert_eq!(table.writers().len(), 2);
        table.sync().unwrap();

        assert_eq!(shared.flush_count(), 1);
        assert_eq!(errors.flush_count(), 1);
    }

    #[test]
    fn test_close_attempts_all_and_returns_first_error() {
        let healthy = MemoryWriter::new();
        let table = LevelDispatchTable::new(
            Arc::new(TextEncoder::new()),
            Arc::new(FailingWriter(io::ErrorKind::PermissionDenied)),
        );
        table.set_writer(Level::Error, Arc::new(healthy.clone()));

        let err = table.close().unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(healthy.close_count(), 1);
    }
}
