//! Lightweight text statistics: sentence splitting, keywords and summaries.
//!
//! The summarizer is extractive: every sentence of the article is scored on
//! overlap with the title, density of the article's top keywords and its
//! position, and the best `n` sentences are returned in document order.
//! Scoring weights are tunables, not part of any contract.

use itertools::Itertools;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

const EN_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "said", "same", "says", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    "yourself", "yourselves", "new", "one", "two", "may", "might", "must", "us", "like",
];

const ES_STOP_WORDS: &[&str] = &[
    "a", "al", "algo", "ante", "con", "como", "contra", "cual", "cuando", "de", "del", "desde",
    "donde", "durante", "e", "el", "ella", "ellas", "ellos", "en", "entre", "era", "es", "esa",
    "ese", "eso", "esta", "este", "esto", "fue", "ha", "han", "hasta", "hay", "la", "las", "le",
    "les", "lo", "los", "mas", "más", "me", "mi", "muy", "no", "nos", "o", "para", "pero",
    "por", "que", "qué", "se", "ser", "si", "sí", "sin", "sobre", "su", "sus", "también", "te",
    "tiene", "un", "una", "uno", "unos", "y", "ya", "yo",
];

const FR_STOP_WORDS: &[&str] = &[
    "a", "à", "au", "aux", "avec", "ce", "ces", "cette", "dans", "de", "des", "du", "elle", "en",
    "est", "et", "eux", "il", "ils", "je", "la", "le", "les", "leur", "lui", "mais", "me", "même",
    "mes", "moi", "mon", "ne", "nos", "notre", "nous", "on", "ou", "où", "par", "pas", "pour",
    "qu", "que", "qui", "sa", "se", "ses", "son", "sur", "ta", "te", "tes", "toi", "ton", "tu",
    "un", "une", "vos", "votre", "vous", "été", "être", "sont", "était", "plus",
];

const DE_STOP_WORDS: &[&str] = &[
    "aber", "als", "am", "an", "auch", "auf", "aus", "bei", "bin", "bis", "da", "das", "dass",
    "dem", "den", "der", "des", "die", "dies", "diese", "doch", "du", "ein", "eine", "einem",
    "einen", "einer", "er", "es", "für", "hat", "hatte", "ich", "ihr", "im", "in", "ist", "ja",
    "kann", "mit", "nach", "nicht", "noch", "nur", "oder", "sich", "sie", "sind", "so", "über",
    "um", "und", "uns", "von", "vor", "war", "was", "wie", "wir", "wird", "zu", "zum", "zur",
];

fn word_set(words: &'static [&'static str]) -> HashSet<&'static str> {
    words.iter().copied().collect()
}

static EN: Lazy<HashSet<&'static str>> = Lazy::new(|| word_set(EN_STOP_WORDS));
static ES: Lazy<HashSet<&'static str>> = Lazy::new(|| word_set(ES_STOP_WORDS));
static FR: Lazy<HashSet<&'static str>> = Lazy::new(|| word_set(FR_STOP_WORDS));
static DE: Lazy<HashSet<&'static str>> = Lazy::new(|| word_set(DE_STOP_WORDS));

/// Abbreviations that end in a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "gen", "gov", "sen", "rep", "lt", "col",
    "sgt", "capt", "inc", "ltd", "co", "corp", "vs", "etc", "jan", "feb", "mar", "apr",
    "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "u.s", "u.k", "e.g", "i.e",
];

/// Stop words for a language hint such as `"en"` or `"es-AR"`.
///
/// Unknown languages fall back to English.
pub fn stop_words(language: &str) -> &'static HashSet<&'static str> {
    let primary = language
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_lowercase();
    match primary.as_str() {
        "es" => &*ES,
        "fr" => &*FR,
        "de" => &*DE,
        _ => &*EN,
    }
}

pub fn is_stop_word(word: &str, language: &str) -> bool {
    stop_words(language).contains(word)
}

/// Lowercased alphanumeric tokens of `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|w| w.trim_matches('\'').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

fn is_sentence_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '”' | '’' | '»')
}

fn ends_with_abbreviation(segment: &str) -> bool {
    let last_word = segment
        .trim_end_matches('.')
        .rsplit(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    // Single letters are initials ("John F. Kennedy").
    (last_word.chars().count() == 1 && last_word.chars().all(char::is_alphabetic))
        || ABBREVIATIONS.contains(&last_word.as_str())
}

/// Split text into sentences.
///
/// Line breaks always end a sentence; otherwise a sentence ends at `.`, `!`,
/// `?` or `…` (plus closing quotes/brackets) followed by whitespace, unless
/// the period belongs to a known abbreviation or an initial.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();

    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        let mut current = String::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            current.push(c);
            if is_sentence_terminal(c) {
                while i + 1 < chars.len() && (is_closing(chars[i + 1]) || is_sentence_terminal(chars[i + 1])) {
                    i += 1;
                    current.push(chars[i]);
                }
                let at_end = i + 1 >= chars.len();
                let followed_by_space = !at_end && chars[i + 1].is_whitespace();
                if at_end || (followed_by_space && !(c == '.' && ends_with_abbreviation(&current))) {
                    let sentence = current.trim();
                    if !sentence.is_empty() {
                        sentences.push(sentence.to_string());
                    }
                    current.clear();
                }
            }
            i += 1;
        }
        let rest = current.trim();
        if !rest.is_empty() {
            sentences.push(rest.to_string());
        }
    }

    sentences
}

/// Most frequent content words of `text`, most frequent first.
///
/// Ties keep the order of first appearance. Stop words, numbers and words
/// shorter than three characters are ignored.
pub fn keywords(text: &str, language: &str, max: usize) -> Vec<String> {
    let stops = stop_words(language);
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

    for (position, token) in tokenize(text).into_iter().enumerate() {
        if token.chars().count() < 3
            || stops.contains(token.as_str())
            || token.chars().all(|c| c.is_numeric())
        {
            continue;
        }
        let entry = counts.entry(token).or_insert((0, position));
        entry.0 += 1;
    }

    counts
        .into_iter()
        .sorted_by(|(_, (ca, pa)), (_, (cb, pb))| cb.cmp(ca).then(pa.cmp(pb)))
        .take(max)
        .map(|(word, _)| word)
        .collect()
}

/// Pick at most `n` sentences that best represent the article.
///
/// Articles with `n` or fewer sentences are returned whole. The selection is
/// returned in document order.
pub fn summarize(title: &str, text: &str, language: &str, n: usize) -> Vec<String> {
    let sentences = split_sentences(text);
    if n == 0 {
        return Vec::new();
    }
    if sentences.len() <= n {
        return sentences;
    }

    let stops = stop_words(language);
    let title_words: HashSet<String> = tokenize(title)
        .into_iter()
        .filter(|w| !stops.contains(w.as_str()))
        .collect();
    let top_words: HashSet<String> = keywords(text, language, 10).into_iter().collect();
    let total = sentences.len() as f64;

    let scored = sentences.iter().enumerate().map(|(i, sentence)| {
        let words: Vec<String> = tokenize(sentence)
            .into_iter()
            .filter(|w| !stops.contains(w.as_str()))
            .collect();
        if words.is_empty() {
            return (i, 0.0);
        }

        let title_score = if title_words.is_empty() {
            0.0
        } else {
            words.iter().filter(|w| title_words.contains(*w)).count() as f64
                / title_words.len() as f64
        };
        let keyword_score =
            words.iter().filter(|w| top_words.contains(*w)).count() as f64 / words.len() as f64;
        let position_score = 1.0 - (i as f64 / total);
        let length_score = {
            let len = words.len() as f64;
            // Peaks around 20 content words, fades for fragments and run-ons.
            (1.0 - ((len - 20.0).abs() / 20.0)).max(0.0)
        };

        let score =
            1.5 * title_score + 2.0 * keyword_score + 1.0 * position_score + 0.5 * length_score;
        (i, score)
    });

    scored
        .sorted_by(|(ia, sa), (ib, sb)| sb.total_cmp(sa).then(ia.cmp(ib)))
        .take(n)
        .map(|(i, _)| i)
        .sorted()
        .map(|i| sentences[i].clone())
        .collect()
}
