//! Dispatch table behavior under live reconfiguration

use proven_logger::test_support::MemoryWriter;
use proven_logger::{
    DispatchLogger, Level, LevelDispatchTable, Logger, LoggerExt, Record, TextEncoder, Writer,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

#[test]
fn test_swapping_writers_while_logging_loses_nothing() {
    let first = MemoryWriter::new();
    let second = MemoryWriter::new();
    let table = Arc::new(LevelDispatchTable::new(
        Arc::new(TextEncoder::new()),
        Arc::new(first.clone()),
    ));
    let logger = Arc::new(DispatchLogger::new(table.clone()));
    let done = Arc::new(AtomicBool::new(false));

    let swapper = {
        let table = table.clone();
        let done = done.clone();
        let (first, second) = (first.clone(), second.clone());
        thread::spawn(move || {
            let mut flip = false;
            while !done.load(Ordering::Relaxed) {
                let next: Arc<dyn Writer> = if flip {
                    Arc::new(first.clone())
                } else {
                    Arc::new(second.clone())
                };
                table.set_all_writers(next);
                flip = !flip;
                thread::yield_now();
            }
        })
    };

    let producers: Vec<_> = (0..4)
        .map(|_| {
            let logger = logger.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    logger.info("tick");
                }
            })
        })
        .collect();

    for producer in producers {
        producer.join().unwrap();
    }
    done.store(true, Ordering::Relaxed);
    swapper.join().unwrap();

    let lines = first.text().lines().count() + second.text().lines().count();
    assert_eq!(lines, 4000);
}

#[test]
fn test_per_level_encoder_and_writer() {
    let debug_sink = MemoryWriter::new();
    let rest = MemoryWriter::new();
    let table = Arc::new(LevelDispatchTable::new(
        Arc::new(TextEncoder::new()),
        Arc::new(rest.clone()),
    ));
    table.set(
        Level::Debug,
        Arc::new(|r: &Record<'_>, buf: &mut Vec<u8>| {
            buf.extend_from_slice(b"dbg:");
            buf.extend_from_slice(r.message.as_bytes());
            buf.push(b'\n');
            Ok::<(), proven_logger::Error>(())
        }),
        Arc::new(debug_sink.clone()),
    );

    let logger = DispatchLogger::new(table);
    logger.debug("cache miss");
    logger.log(Record::new(Level::Warn, "slow query").with_target("db"));

    assert_eq!(debug_sink.text(), "dbg:cache miss\n");
    assert_eq!(rest.text(), "WARN [db] slow query\n");
}
