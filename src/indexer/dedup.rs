use super::chunker::content_hash;
use std::collections::HashSet;

/// Remembers the digests of chunks already accepted for one file
#[derive(Debug, Default)]
pub struct ChunkDeduplicator {
    seen: HashSet<String>,
}

impl ChunkDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chunk's digest the first time the text is seen, `None` after that
    pub fn admit(&mut self, text: &str) -> Option<String> {
        let hash = content_hash(text);
        if self.seen.insert(hash.clone()) {
            Some(hash)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_rejected() {
        let mut dedup = ChunkDeduplicator::new();
        let first = dedup.admit("All rights reserved.");
        assert_eq!(first, Some(content_hash("All rights reserved.")));
        assert_eq!(dedup.admit("All rights reserved."), None);
        assert!(dedup.admit("Different chunk").is_some());
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_separate_instances_do_not_share_state() {
        let mut a = ChunkDeduplicator::new();
        let mut b = ChunkDeduplicator::new();
        assert!(a.admit("same text").is_some());
        assert!(b.admit("same text").is_some());
    }
}
