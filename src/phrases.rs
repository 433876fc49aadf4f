//! Fixed prompts and phrase helpers shared by the game modes

/// Spoken after a wrong answer
pub const TRY_AGAIN: &str = "Try again";

/// Spoken when a spelling hint is revealed
pub const HINT: &str = "Here is a hint.";

/// Reward phrase for a correctly answered word
#[must_use]
pub fn correct(word: &str) -> String {
    format!("Correct! {word}")
}

/// Card indices worth having cached while studying card `index`
///
/// Returns the current card followed by the next and previous ones, wrapping
/// around the deck. Small decks repeat indices.
#[must_use]
pub const fn study_window(len: usize, index: usize) -> [usize; 3] {
    if len == 0 {
        return [0; 3];
    }
    let current = index % len;
    let next = (current + 1) % len;
    let prev = (current + len - 1) % len;
    [current, next, prev]
}
