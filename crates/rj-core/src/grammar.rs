//! Local grammar normalization, used whenever the remote cleanup service is
//! unavailable. Targets the usual speech-to-text slips in journal prose.

use once_cell::sync::Lazy;
use regex::Regex;

const VOICE_CORRECTIONS: &[(&str, &str)] = &[
    (r"\bu\b", "you"),
    (r"\bur\b", "your"),
    (r"\bure\b", "you're"),
    (r"\bcuz\b", "because"),
    (r"\bwanna\b", "want to"),
    (r"\bgonna\b", "going to"),
    (r"\bgotta\b", "got to"),
    (r"\blemme\b", "let me"),
    (r"\bimma\b", "I'm going to"),
    (r"\bthru\b", "through"),
    (r"\btho\b", "though"),
    (r"\bprobly\b", "probably"),
    (r"\bdefinately\b", "definitely"),
    (r"\bdont\b", "don't"),
    (r"\bcant\b", "can't"),
    (r"\bwont\b", "won't"),
    (r"\bisnt\b", "isn't"),
    (r"\barent\b", "aren't"),
    (r"\bwasnt\b", "wasn't"),
    (r"\bwerent\b", "weren't"),
    (r"\bhavent\b", "haven't"),
    (r"\bhasnt\b", "hasn't"),
    (r"\bhadnt\b", "hadn't"),
    (r"\bwouldnt\b", "wouldn't"),
    (r"\bcouldnt\b", "couldn't"),
    (r"\bshouldnt\b", "shouldn't"),
    (r"\bdoesnt\b", "doesn't"),
    (r"\bdidnt\b", "didn't"),
    (r"\bim\b", "I'm"),
    (r"\bive\b", "I've"),
    (r"\bthats\b", "that's"),
    (r"\btheres\b", "there's"),
    (r"\bwheres\b", "where's"),
    (r"\bwhos\b", "who's"),
    (r"\bwhats\b", "what's"),
    (r"\bthere\s+going\b", "they're going"),
    (r"\byour\s+welcome\b", "you're welcome"),
    (r"\byour\s+right\b", "you're right"),
    (r"\byour\s+wrong\b", "you're wrong"),
];

static CORRECTIONS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    VOICE_CORRECTIONS
        .iter()
        .filter_map(|(pattern, replacement)| {
            Regex::new(&format!("(?i){}", pattern))
                .ok()
                .map(|re| (re, *replacement))
        })
        .collect()
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static LONE_I: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bi\b").expect("static regex"));
static I_CONTRACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bi'(m|ll|ve|d)\b").expect("static regex"));

/// Applies the common voice-to-text corrections only.
pub fn fix_voice_errors(text: &str) -> String {
    CORRECTIONS
        .iter()
        .fold(text.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

/// Corrections, whitespace collapse, `I` capitalization, leading capital and
/// a terminal period when none is present. Blank input is returned as-is.
pub fn normalize(text: &str) -> String {
    if text.trim().is_empty() {
        return text.to_string();
    }

    let corrected = fix_voice_errors(text.trim());
    let collapsed = WHITESPACE.replace_all(&corrected, " ");
    let with_i = LONE_I.replace_all(&collapsed, "I");
    let with_contractions = I_CONTRACTION.replace_all(&with_i, |caps: &regex::Captures| {
        format!("I'{}", caps[1].to_lowercase())
    });

    let mut formatted = capitalize_first(with_contractions.trim());
    if !formatted.ends_with(['.', '!', '?']) {
        formatted.push('.');
    }
    formatted
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
