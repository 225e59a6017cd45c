// ClipForge Token Grouping
// Copyright (c) 2026 Xing_The_Creator | ClipForge
//
// Groups whisper.cpp sub-word tokens back into words.
#![cfg_attr(not(feature = "native-whisper"), allow(dead_code))]

use super::Word;

/// A decoded token with its timing in centiseconds.
#[derive(Debug, Clone)]
pub(crate) struct RawToken {
    pub text: String,
    pub t0: i64,
    pub t1: i64,
}

fn is_special(text: &str) -> bool {
    text.starts_with("[_") || text.starts_with("<|")
}

/// A token opening with whitespace starts a new word; anything else is
/// glued onto the previous one.
pub(crate) fn group_tokens(tokens: &[RawToken]) -> Vec<Word> {
    let mut words: Vec<Word> = Vec::new();

    for token in tokens.iter().filter(|t| !is_special(&t.text)) {
        let start = token.t0.max(0) as f64 / 100.0;
        let end = (token.t1.max(token.t0)).max(0) as f64 / 100.0;
        let opens_word = token.text.starts_with(char::is_whitespace);

        match words.last_mut() {
            Some(current) if !opens_word => {
                current.text.push_str(&token.text);
                current.end = current.end.max(end);
            }
            _ => {
                if token.text.trim().is_empty() {
                    continue;
                }
                words.push(Word::new(token.text.clone(), start, end));
            }
        }
    }

    for word in &mut words {
        word.text = word.text.trim().to_string();
    }
    words
}
