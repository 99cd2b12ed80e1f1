//! Transcript normalization
//!
//! Turns a raw transcript into lowercase tokens: decimal numbers stay whole,
//! homophones and number words are corrected, "go to" fuses into "goto" and
//! "and" misheard for "end" is repaired.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// A normalized lowercase word or decimal-number literal
pub type Token = String;

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    // Decimals bind before plain word boundaries so "3.5" stays one token
    TOKEN_RE.get_or_init(|| Regex::new(r"\d+\.\d+|\w+").expect("token pattern is valid"))
}

/// Built-in corrections; an empty replacement deletes the token
const CORRECTIONS: &[(&str, &str)] = &[
    ("some", "sum"),
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
    ("nine", "9"),
    ("zero", "0"),
    ("compiled", "compile"),
    ("right", "write"),
    ("uh", ""),
];

/// Lexical correction over already-split words
#[derive(Debug, Clone)]
pub struct Normalizer {
    corrections: HashMap<String, String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        let corrections = CORRECTIONS
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();
        Self { corrections }
    }

    /// Add or override corrections; keys are matched lowercase
    pub fn with_corrections<'a>(
        mut self,
        extra: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) -> Self {
        for (from, to) in extra {
            self.corrections
                .insert(from.to_lowercase(), to.to_lowercase());
        }
        self
    }

    /// Apply the correction table once per word
    pub fn correct(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        match self.corrections.get(&lower) {
            Some(replacement) => replacement.clone(),
            None => lower,
        }
    }

    pub fn normalize<I, S>(&self, words: I) -> Vec<Token>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut tokens: Vec<Token> = words
            .into_iter()
            .map(|w| self.correct(w.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();

        fuse(&mut tokens);
        tokens.retain(|t| !t.is_empty());
        tokens
    }
}

/// Pairwise fusion pass
fn fuse(tokens: &mut Vec<Token>) {
    let mut i = 0;
    while i < tokens.len() {
        let next = tokens.get(i + 1).map(String::as_str);

        if tokens[i] == "go" && next == Some("to") {
            tokens[i] = "goto".to_string();
            tokens.remove(i + 1);
        } else if tokens[i] == "and"
            && (next == Some("selection") || (i > 0 && tokens[i - 1] == "document"))
        {
            tokens[i] = "end".to_string();
        }

        i += 1;
    }
}

/// Splits a raw transcript and normalizes the result
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    normalizer: Normalizer,
}

impl Tokenizer {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    pub fn tokenize(&self, raw: &str) -> Vec<Token> {
        self.normalizer.normalize(split_words(raw))
    }
}

/// Extract word and decimal-number tokens, in order
pub fn split_words(raw: &str) -> impl Iterator<Item = &str> {
    token_re().find_iter(raw).map(|m| m.as_str())
}
