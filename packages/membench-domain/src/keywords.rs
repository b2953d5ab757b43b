use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

/// Tokens shorter than this many characters never count as keywords.
pub const MIN_KEYWORD_CHARS: usize = 3;

pub const STOP_WORDS: [&str; 63] = [
	"the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
	"do", "does", "did", "will", "would", "should", "could", "may", "might", "must", "shall",
	"can", "to", "of", "in", "for", "on", "at", "from", "by", "with", "as", "and", "or", "but",
	"not", "no", "yes", "it", "this", "that", "these", "those", "i", "you", "he", "she", "we",
	"they", "what", "which", "who", "when", "where", "why", "how", "said", "says", "told",
	"asked",
];

static WORD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"\w+").expect("Word pattern must compile."));
static STOP_WORD_SET: LazyLock<HashSet<&'static str>> =
	LazyLock::new(|| STOP_WORDS.into_iter().collect());

pub type KeywordSet = HashSet<String>;

pub fn extract_keywords(text: &str) -> KeywordSet {
	if text.is_empty() {
		return KeywordSet::new();
	}

	let lowered = text.to_lowercase();

	WORD.find_iter(&lowered)
		.map(|m| m.as_str())
		.filter(|token| token.chars().count() >= MIN_KEYWORD_CHARS)
		.filter(|token| !STOP_WORD_SET.contains(token))
		.map(str::to_string)
		.collect()
}
