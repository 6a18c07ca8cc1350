//! Placeholder post metadata for processed images.
//!
//! Titles, body text and tags are generated, not derived from the image. All
//! randomness is drawn through [`ContentSource`] so callers can make the output
//! deterministic.

use postpix_core::PostRecord;
use rand::{Rng, RngCore};
use std::sync::Arc;

pub const TITLE_PREFIX: &str = "Post ";
pub const TEXT_PREFIX: &str = "Generated text: ";

/// Random bytes behind the title token (8 hex characters).
pub const TITLE_TOKEN_BYTES: usize = 4;
/// Random bytes behind the body token (24 hex characters).
pub const TEXT_TOKEN_BYTES: usize = 12;

/// Number of tags drawn per post, with replacement.
pub const TAG_COUNT: usize = 3;

pub const TAG_VOCABULARY: [&str; 12] = [
    "nature", "city", "car", "cat", "dog", "fun", "meme", "cloud", "ai", "game", "art", "random",
];

/// Source of randomness for generated content
pub trait ContentSource: Send + Sync {
    /// Fill `buf` with random bytes.
    fn fill_bytes(&self, buf: &mut [u8]);

    /// Uniform index in `0..upper`. `upper` is never zero.
    fn index_below(&self, upper: usize) -> usize;
}

/// Thread-local RNG backed content source
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomContentSource;

impl ContentSource for RandomContentSource {
    fn fill_bytes(&self, buf: &mut [u8]) {
        rand::rng().fill_bytes(buf);
    }

    fn index_below(&self, upper: usize) -> usize {
        rand::rng().random_range(0..upper)
    }
}

pub struct MetadataSynthesizer {
    source: Arc<dyn ContentSource>,
}

impl MetadataSynthesizer {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }

    /// Build the post record for a derivative served at `image_url`.
    ///
    /// `created_at` is left unset; the store assigns it on insert.
    pub fn synthesize(&self, image_url: &str) -> PostRecord {
        let title = format!("{}{}", TITLE_PREFIX, self.hex_token(TITLE_TOKEN_BYTES));
        let text = format!("{}{}", TEXT_PREFIX, self.hex_token(TEXT_TOKEN_BYTES));
        let tags = (0..TAG_COUNT)
            .map(|_| TAG_VOCABULARY[self.source.index_below(TAG_VOCABULARY.len())].to_string())
            .collect();

        PostRecord {
            image_url: image_url.to_string(),
            title,
            text,
            tags,
            created_at: None,
        }
    }

    fn hex_token(&self, len: usize) -> String {
        let mut bytes = vec![0u8; len];
        self.source.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

impl Default for MetadataSynthesizer {
    fn default() -> Self {
        Self::new(Arc::new(RandomContentSource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fills every byte with `byte` and walks through `indices` cyclically.
    struct FixedSource {
        byte: u8,
        indices: Vec<usize>,
        next: AtomicUsize,
    }

    impl ContentSource for FixedSource {
        fn fill_bytes(&self, buf: &mut [u8]) {
            buf.fill(self.byte);
        }

        fn index_below(&self, upper: usize) -> usize {
            let i = self.next.fetch_add(1, Ordering::SeqCst);
            self.indices[i % self.indices.len()] % upper
        }
    }

    #[test]
    fn test_deterministic_source() {
        let synthesizer = MetadataSynthesizer::new(Arc::new(FixedSource {
            byte: 0xab,
            indices: vec![3, 10, 3],
            next: AtomicUsize::new(0),
        }));

        let post = synthesizer.synthesize("https://in.s3.us-east-1.amazonaws.com/output/a.jpg");
        assert_eq!(post.title, "Post abababab");
        assert_eq!(post.text, "Generated text: abababababababababababab");
        assert_eq!(post.tags, vec!["cat", "art", "cat"]);
        assert_eq!(post.tags_csv(), "cat,art,cat");
        assert_eq!(post.image_url, "https://in.s3.us-east-1.amazonaws.com/output/a.jpg");
        assert!(post.created_at.is_none());
    }

    #[test]
    fn test_random_source_shape() {
        let synthesizer = MetadataSynthesizer::default();
        for _ in 0..200 {
            let post = synthesizer.synthesize("u");

            let title_token = post.title.strip_prefix(TITLE_PREFIX).unwrap();
            assert_eq!(title_token.len(), 8);
            assert!(title_token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

            let text_token = post.text.strip_prefix(TEXT_PREFIX).unwrap();
            assert_eq!(text_token.len(), 24);
            assert!(text_token.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

            let csv = post.tags_csv();
            let tags: Vec<&str> = csv.split(',').collect();
            assert_eq!(tags.len(), TAG_COUNT);
            assert!(tags.iter().all(|t| TAG_VOCABULARY.contains(t)));
        }
    }
}
