//! File-based persistence via JSON Lines event sourcing.
//!
//! Events are stored as one JSON object per line (`.jsonl` format). A book
//! is restored by replaying the file onto an empty book.
//!
//! # Usage
//!
//! ```ignore
//! use callbook::OrderBook;
//! use std::path::Path;
//!
//! book.save(Path::new("BNB_BTC.jsonl"))?;
//! let restored = OrderBook::load(Path::new("BNB_BTC.jsonl"), book.comparator())?;
//! ```
//!
//! The file holds events only. Load it onto a book built with the same
//! precision (and, for [`load_into`](OrderBook::load_into), the same
//! backend) it was recorded with.

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::Path;

use crate::{OrderBook, PriceComparator};
use crate::event::Event;
use crate::index::PriceIndex;

/// Save events to a file in JSON Lines format.
pub fn save_events(events: &[Event], path: &Path) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    for event in events {
        let json = serde_json::to_string(event).map_err(io::Error::other)?;
        writeln!(writer, "{json}")?;
    }

    writer.flush()
}

/// Load events from a JSON Lines file.
///
/// Empty lines are skipped. A malformed line fails with
/// `InvalidData`, naming the line.
pub fn load_events(path: &Path) -> io::Result<Vec<Event>> {
    let reader = io::BufReader::new(File::open(path)?);
    let mut events = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(line).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("line {}: {}", line_num + 1, e),
            )
        })?;
        events.push(event);
    }

    Ok(events)
}

impl<I: PriceIndex> OrderBook<I> {
    /// Save the book's event log to a file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        save_events(self.events(), path)
    }

    /// Restore a saved event log onto this book, usually an empty one.
    ///
    /// An event that no longer applies (say, a remove with no matching
    /// insert) fails with `InvalidData`.
    pub fn load_into(self, path: &Path) -> io::Result<Self> {
        let events = load_events(path)?;
        self.replay_into(&events)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl OrderBook {
    /// Restore a B-tree book under `comparator` from a saved event log.
    pub fn load(path: &Path, comparator: PriceComparator) -> io::Result<Self> {
        Self::with_comparator(comparator).load_into(path)
    }
}
