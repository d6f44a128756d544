//! Prompt rendering.
//!
//! Output depends only on the query and the documents: fields are emitted in
//! sorted key order, and nothing time- or randomness-dependent is included,
//! so identical input always yields byte-identical prompts.

use crate::models::{render_value, EnrichedDocument};

const GROUNDED_PREAMBLE: &[&str] = &[
    "You are a knowledgeable assistant specializing in restaurant recommendations.",
    "Always answer confidently, using clear and direct language.",
    "Avoid expressions of uncertainty; fill in gaps with reasonable assumptions if necessary.",
];

const GROUNDED_CLOSING: &[&str] = &[
    "Using the above context, offer a direct recommendation.",
    "If information is missing, confidently fill in plausible details without mentioning limitations.",
    "Avoid apologies or statements of ignorance.",
];

const FALLBACK_PREAMBLE: &[&str] = &[
    "You are a warm and engaging restaurant recommendation chatbot.",
    "Your responses should be professional yet approachable, including 1-3 emojis (🍽️, 😄, 🍴, 🍲, 🤖) where natural.",
];

const FALLBACK_GUIDELINES: &[&str] = &[
    "- For greetings (hi, hello, hey), respond with a welcoming message and a short intro about yourself.",
    "- For queries like 'who are you' or 'what can you do', explain your role enthusiastically with a couple of emojis.",
    "- Keep messages concise, friendly, and on-topic (restaurant and dining-related).",
    "- Do not engage with personal or unrelated questions.",
    "- Maintain a premium but friendly tone throughout.",
];

/// Which prompt template a document set produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptStyle {
    Grounded,
    Fallback,
}

pub fn style_for(docs: &[EnrichedDocument]) -> PromptStyle {
    if docs.iter().any(|doc| doc.vector_type.is_known()) {
        PromptStyle::Grounded
    } else {
        PromptStyle::Fallback
    }
}

pub fn build(query: &str, docs: &[EnrichedDocument]) -> String {
    match style_for(docs) {
        PromptStyle::Grounded => grounded(query, docs),
        PromptStyle::Fallback => fallback(query),
    }
}

fn grounded(query: &str, docs: &[EnrichedDocument]) -> String {
    let mut lines: Vec<String> = GROUNDED_PREAMBLE.iter().map(|s| s.to_string()).collect();
    lines.push(String::new());
    lines.push(format!("User Query: {}", query));
    lines.push(String::new());

    for (idx, doc) in docs.iter().enumerate() {
        lines.push(format!("--- Document {} ({}) ---", idx + 1, doc.vector_type));
        for (field, value) in doc.fields() {
            lines.push(format!("{}: {}", field, render_value(&value)));
        }
        let score = doc
            .score
            .map(|s| s.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        lines.push(format!("Relevance Score: {}", score));
        lines.push(String::new());
    }

    lines.extend(GROUNDED_CLOSING.iter().map(|s| s.to_string()));
    lines.join("\n")
}

fn fallback(query: &str) -> String {
    let mut lines: Vec<String> = FALLBACK_PREAMBLE.iter().map(|s| s.to_string()).collect();
    lines.push(String::new());
    lines.push("Guidelines:".to_string());
    lines.extend(FALLBACK_GUIDELINES.iter().map(|s| s.to_string()));
    lines.push(String::new());
    lines.push("Use chat history if needed for better context.".to_string());
    lines.push(String::new());
    lines.push(format!("User Query: {}", query));
    lines.join("\n")
}
