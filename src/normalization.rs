/// Normalizes a name by stripping any surrounding whitespace and
/// decomposing it into Unicode Normalization Form D, so that composed
/// and decomposed accents compare equal.
///
/// ```
/// use ubs_finder::normalization::normalize_name;
/// assert_eq!(normalize_name(" T\u{e9}tano "), normalize_name("Te\u{301}tano"));
/// ```
pub fn normalize_name(name: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    name.as_ref().trim().nfd().to_string()
}

/// Returns the form of `text` used for case-insensitive matching.
/// Accents are composed, so `"a\u{301}"` equals `"á"` but a bare `"a"`
/// never matches inside `"á"`.
pub fn search_key(text: impl AsRef<str>) -> String {
    use unicode_normalization::UnicodeNormalization;

    text.as_ref().trim().nfc().collect::<String>().to_lowercase()
}
