use super::cleaner::normalize_whitespace;
use sha2::{Digest, Sha256};

/// Splits text into fixed-size character windows that overlap
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_chars: usize,
    overlap: usize,
}

/// One window of the normalized text, positions counted in chars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextWindow {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl TextChunker {
    /// `overlap` must be smaller than `max_chars`; larger values are clamped so
    /// every window still advances.
    pub fn new(max_chars: usize, overlap: usize) -> Self {
        let max_chars = max_chars.max(1);
        Self {
            max_chars,
            overlap: overlap.min(max_chars - 1),
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Lazily window `text` after collapsing its whitespace
    pub fn chunks(&self, text: &str) -> Chunks {
        let text = normalize_whitespace(text);
        let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        offsets.push(text.len());
        let next_start = if text.is_empty() { None } else { Some(0) };

        Chunks {
            text,
            offsets,
            max_chars: self.max_chars,
            overlap: self.overlap,
            next_start,
        }
    }
}

/// Iterator over the windows of one text, see [`TextChunker::chunks`]
#[derive(Debug, Clone)]
pub struct Chunks {
    text: String,
    /// Byte offset of every char, plus the total length
    offsets: Vec<usize>,
    max_chars: usize,
    overlap: usize,
    next_start: Option<usize>,
}

impl Chunks {
    /// Length of the normalized text in chars
    pub fn char_len(&self) -> usize {
        self.offsets.len() - 1
    }
}

impl Iterator for Chunks {
    type Item = TextWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.next_start?;
        let len = self.char_len();
        let end = (start + self.max_chars).min(len);

        let text = self.text[self.offsets[start]..self.offsets[end]].to_string();

        self.next_start = if end == len {
            None
        } else {
            Some(end.saturating_sub(self.overlap).max(start + 1))
        };

        Some(TextWindow { start, end, text })
    }
}

/// SHA-256 hex digest of a chunk's text
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(chunker: &TextChunker, text: &str) -> Vec<(usize, usize)> {
        chunker.chunks(text).map(|w| (w.start, w.end)).collect()
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        let chunker = TextChunker::new(2000, 150);
        assert_eq!(chunker.chunks("").count(), 0);
        assert_eq!(chunker.chunks("   \n\t ").count(), 0);
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunker = TextChunker::new(2000, 150);
        let chunks: Vec<_> = chunker.chunks("  Hello \n\n  world\t again ").collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world again");
        assert_eq!((chunks[0].start, chunks[0].end), (0, 17));
    }

    #[test]
    fn test_3500_chars_two_chunks() {
        let text: String = (0..3500).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        let chunker = TextChunker::new(2000, 150);
        let chunks: Vec<_> = chunker.chunks(&text).collect();

        assert_eq!(chunks.len(), 2);
        assert_eq!((chunks[0].start, chunks[0].end), (0, 2000));
        assert_eq!((chunks[1].start, chunks[1].end), (1850, 3500));
        assert_eq!(chunks[1].text.chars().count(), 1650);
        assert_eq!(&chunks[0].text[1850..], &chunks[1].text[..150]);
    }

    #[test]
    fn test_exact_multiple_has_no_trailing_overlap_chunk() {
        let text = "x".repeat(2000);
        let chunker = TextChunker::new(2000, 150);
        assert_eq!(spans(&chunker, &text), vec![(0, 2000)]);
    }

    #[test]
    fn test_windows_cover_text_without_gaps() {
        let text: String = (0..10_007).map(|i| (b'0' + (i % 10) as u8) as char).collect();
        let chunker = TextChunker::new(700, 64);
        let windows = spans(&chunker, &text);

        assert_eq!(windows.first().unwrap().0, 0);
        assert_eq!(windows.last().unwrap().1, 10_007);
        for pair in windows.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            assert_eq!(prev.1 - next.0, 64, "consecutive windows overlap by 64");
            assert!(prev.1 - prev.0 <= 700);
        }
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(200);
        let chunker = TextChunker::new(300, 40);
        let first: Vec<_> = chunker.chunks(&text).collect();
        let second: Vec<_> = chunker.chunks(&text).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_multibyte_chars_counted_as_chars() {
        let text = "é".repeat(25);
        let chunker = TextChunker::new(10, 2);
        let chunks: Vec<_> = chunker.chunks(&text).collect();

        assert_eq!(spans(&chunker, &text), vec![(0, 10), (8, 18), (16, 25)]);
        assert!(chunks.iter().all(|c| c.text.chars().count() <= 10));
        assert_eq!(chunks[2].text, "é".repeat(9));
    }

    #[test]
    fn test_overlap_clamped_below_size() {
        let chunker = TextChunker::new(5, 9);
        assert_eq!(chunker.overlap(), 4);
        let windows = spans(&chunker, "abcdefghij");
        assert_eq!(windows, vec![(0, 5), (1, 6), (2, 7), (3, 8), (4, 9), (5, 10)]);
    }

    #[test]
    fn test_content_hash_is_stable() {
        let a = content_hash("repeated legal boilerplate");
        let b = content_hash("repeated legal boilerplate");
        let c = content_hash("different text");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
        assert_eq!(
            content_hash(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
