//! Reading time estimate for post content

use super::ContentBlock;

/// Average reading speed used by post pages
pub const WORDS_PER_MINUTE: usize = 200;

/// Number of whitespace-separated words; blank strings have none
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Total words across every heading and body span, in source order
pub fn total_words(content: &[ContentBlock]) -> usize {
    content
        .iter()
        .map(|block| {
            count_words(&block.heading)
                + block
                    .body
                    .iter()
                    .map(|span| count_words(&span.text))
                    .sum::<usize>()
        })
        .sum()
}

/// Minutes needed to read `content`, rounded up
pub fn estimate(content: &[ContentBlock]) -> usize {
    estimate_with_rate(content, WORDS_PER_MINUTE)
}

/// Same as [`estimate`] with a custom words-per-minute rate (zero is treated as one)
pub fn estimate_with_rate(content: &[ContentBlock], words_per_minute: usize) -> usize {
    total_words(content).div_ceil(words_per_minute.max(1))
}
