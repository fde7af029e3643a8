//! Caller-owned index of the keywords in a stream.
//!
//! The original implementation kept process-wide inverse-map caches to avoid
//! re-reading keyword payloads; here the cache is an explicit object the
//! caller builds from a scan and passes into load operations. It must be
//! cleared (or dropped) whenever the underlying stream is closed or
//! repositioned by other code — it holds offsets, not data.

use std::collections::HashMap;
use std::io::{Read, Seek};

use log::{debug, info};

use super::error::Result;
use super::keyword::{Keyword, KwHeader};
use super::stream::RecordStream;

/// One scanned keyword: its header and the file offset of its header record.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub header: KwHeader,
    pub offset: u64,
}

/// An index of `(name, offset, header)` entries in file order.
#[derive(Debug, Default)]
pub struct KeywordCache {
    entries: Vec<CacheEntry>,
    by_name: HashMap<String, Vec<usize>>,
}

impl KeywordCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the whole stream from the start, skipping payloads.
    pub fn scan<S: Read + Seek>(stream: &mut RecordStream<S>) -> Result<Self> {
        stream.rewind()?;
        let mut cache = Self::new();
        loop {
            let offset = stream.tell()?;
            match KwHeader::read(stream)? {
                Some(header) => {
                    debug!(
                        "scanned {} {} x{} at offset {}",
                        header.name,
                        header.kw_type.tag(),
                        header.count,
                        offset
                    );
                    Keyword::skip_payload(stream, &header)?;
                    cache.push(CacheEntry { header, offset });
                }
                None => break,
            }
        }
        info!("keyword scan complete: {} entries", cache.len());
        Ok(cache)
    }

    /// Append an entry, keeping the name lookup in sync.
    pub fn push(&mut self, entry: CacheEntry) {
        let index = self.entries.len();
        self.by_name
            .entry(entry.header.name.clone())
            .or_default()
            .push(index);
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in file order — the order of occurrence is never reordered.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.iter()
    }

    /// All entries named `name`, in file order.
    pub fn named(&self, name: &str) -> Vec<&CacheEntry> {
        match self.by_name.get(name) {
            Some(indices) => indices.iter().map(|&i| &self.entries[i]).collect(),
            None => Vec::new(),
        }
    }

    /// Header-record offset of the first keyword named `name`.
    pub fn first_offset(&self, name: &str) -> Option<u64> {
        self.by_name
            .get(name)
            .and_then(|indices| indices.first())
            .map(|&i| self.entries[i].offset)
    }

    pub fn count_named(&self, name: &str) -> usize {
        self.by_name.get(name).map_or(0, |indices| indices.len())
    }

    /// Entries sorted by offset. The sort is stable: entries with equal
    /// offsets keep their scan order.
    pub fn iter_sorted_by_offset(&self) -> Vec<&CacheEntry> {
        let mut sorted: Vec<&CacheEntry> = self.entries.iter().collect();
        sorted.sort_by_key(|entry| entry.offset);
        sorted
    }

    /// Invalidate the cache. Required whenever the stream it was scanned
    /// from is closed or repositioned outside this object's control.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_name.clear();
    }
}
