/// Normalize a user-supplied ticker symbol: surrounding whitespace is dropped
/// and letters are uppercased. Blank input yields `None`.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim();

    if symbol.is_empty() {
        None
    } else {
        Some(symbol.to_uppercase())
    }
}
