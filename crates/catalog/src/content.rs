/// Terms that may not appear in a product name or description.
pub const FORBIDDEN_WORDS: [&str; 9] = [
    "казино",
    "криптовалюта",
    "крипта",
    "биржа",
    "дешево",
    "бесплатно",
    "обман",
    "полиция",
    "радар",
];

/// First forbidden term contained in `text`, compared case-insensitively.
pub fn find_forbidden_word(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    FORBIDDEN_WORDS
        .into_iter()
        .find(|word| lowered.contains(*word))
}
