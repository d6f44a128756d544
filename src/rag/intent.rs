//! Small-talk detection.
//!
//! Greetings, thanks and questions about the assistant itself are answered
//! with the conversational prompt and never hit the vector index.

/// Query intent categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// "hi", "who are you?", "thanks!"
    SmallTalk,
    /// Anything that may need restaurant or menu context.
    Lookup,
}

const GREETINGS: &[&str] = &[
    "hi",
    "hii",
    "hello",
    "hey",
    "heya",
    "hola",
    "namaste",
    "good morning",
    "good afternoon",
    "good evening",
];

const SELF_QUESTIONS: &[&str] = &[
    "who are you",
    "what are you",
    "what can you do",
    "what do you do",
    "how can you help",
    "introduce yourself",
];

const THANKS: &[&str] = &["thanks", "thank you", "thx", "bye", "goodbye"];

/// Messages longer than this are never treated as a bare greeting.
const MAX_GREETING_WORDS: usize = 4;

pub fn classify(message: &str) -> QueryIntent {
    let normalized = normalize(message);
    if normalized.is_empty() {
        return QueryIntent::SmallTalk;
    }

    if SELF_QUESTIONS.iter().any(|q| normalized.contains(q)) {
        return QueryIntent::SmallTalk;
    }

    let word_count = normalized.split_whitespace().count();
    if word_count <= MAX_GREETING_WORDS
        && GREETINGS
            .iter()
            .chain(THANKS.iter())
            .any(|phrase| starts_with_phrase(&normalized, phrase))
    {
        return QueryIntent::SmallTalk;
    }

    QueryIntent::Lookup
}

/// Lowercase words separated by single spaces, punctuation stripped.
fn normalize(message: &str) -> String {
    message
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn starts_with_phrase(normalized: &str, phrase: &str) -> bool {
    normalized == phrase
        || normalized
            .strip_prefix(phrase)
            .is_some_and(|rest| rest.starts_with(' '))
}
