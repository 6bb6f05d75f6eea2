//! Plain-text statistics

/// Words per minute used for reading time estimates
pub const WORDS_PER_MINUTE: usize = 200;

/// Count words in plain text
pub fn count_words(text: &str) -> usize {
    let mut count = 0;
    let mut in_word = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if !in_word {
                in_word = true;
                count += 1;
            }
        } else {
            in_word = false;
        }
    }

    count
}

/// Reading time in whole minutes, at least one
pub fn reading_time(words: usize) -> usize {
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}
