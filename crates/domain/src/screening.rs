use serde::Serialize;
use serde_json::Value;

/// Built-in denylist: profanity, hate-speech markers, spam phrases, and
/// explicit-content terms. Deliberately naive local matching; a real
/// moderation service can replace the list behind the same screener.
pub const DEFAULT_DENYLIST: &[&str] = &[
    "fuck",
    "shit",
    "bitch",
    "asshole",
    "bastard",
    "kill yourself",
    "go die",
    "buy now",
    "click here",
    "free money",
    "limited time offer",
    "work from home",
    "porn",
    "xxx",
    "nsfw",
];

const REPEATED_RUN_LEN: usize = 5;
const REASON_REPEATED_CHARACTERS: &str = "repeated characters";
const REASON_CONTAINS_LINKS: &str = "contains links";

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ScreenOutcome {
    pub allowed: bool,
    pub reasons: Vec<String>,
}

/// Denylist-plus-heuristics content filter. Explicitly constructed and
/// injected at the composition root; the denylist is plain configuration
/// data, so there is no process-wide singleton to reach for.
#[derive(Clone, Debug)]
pub struct ContentScreener {
    denylist: Vec<String>,
}

impl Default for ContentScreener {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST.iter().map(|term| (*term).to_string()))
    }
}

impl ContentScreener {
    pub fn new(denylist: impl IntoIterator<Item = String>) -> Self {
        Self {
            denylist: denylist
                .into_iter()
                .map(|term| term.to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }

    /// Purely local string matching: no network, no external classifier.
    /// `allowed` is true iff no reason fired; matched denylist terms are
    /// reported verbatim.
    pub fn screen(&self, text: &str) -> ScreenOutcome {
        let lowered = text.to_lowercase();
        let mut reasons = Vec::new();

        for term in &self.denylist {
            if lowered.contains(term.as_str()) {
                reasons.push(term.clone());
            }
        }
        if has_repeated_run(text, REPEATED_RUN_LEN) {
            reasons.push(REASON_REPEATED_CHARACTERS.to_string());
        }
        if lowered.contains("http://") || lowered.contains("https://") {
            reasons.push(REASON_CONTAINS_LINKS.to_string());
        }

        ScreenOutcome {
            allowed: reasons.is_empty(),
            reasons,
        }
    }
}

fn has_repeated_run(text: &str, run_len: usize) -> bool {
    let mut previous: Option<char> = None;
    let mut run = 0usize;
    for ch in text.chars() {
        if previous == Some(ch) {
            run += 1;
        } else {
            previous = Some(ch);
            run = 1;
        }
        if run >= run_len {
            return true;
        }
    }
    false
}

/// Side-effect-free plain-text extraction from the opaque rich-text payload.
/// Only string values are collected; keys and scalar types are ignored.
pub fn extract_plain_text(content: &Value) -> String {
    let mut parts = Vec::new();
    collect_strings(content, &mut parts);
    parts.join(" ")
}

fn collect_strings(value: &Value, parts: &mut Vec<String>) {
    match value {
        Value::String(text) => {
            let text = text.trim();
            if !text.is_empty() {
                parts.push(text.to_string());
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_strings(item, parts);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_strings(item, parts);
            }
        }
        _ => {}
    }
}
