//! Light English suffix stripping.
//!
//! Not a full Porter stemmer: it conflates the inflections that matter for
//! short plot synopses (plurals, `-ing`, `-ed`, `-ation`, `-ness`, `-ment`)
//! and drops a trailing `e`, so `house`/`houses` and `solve`/`solving`
//! share a stem.

/// Suffixes tried longest first, with their replacement.
const SUFFIXES: &[(&str, &str)] = &[
    ("ations", "ate"),
    ("ation", "ate"),
    ("nesses", ""),
    ("ness", ""),
    ("ments", ""),
    ("ment", ""),
    ("ings", ""),
    ("ing", ""),
    ("ies", "y"),
    ("ied", "y"),
    ("ed", ""),
    ("s", ""),
];

const MIN_STEM: usize = 3;

/// Stems a lowercased token. Tokens that are short or not purely ASCII
/// alphabetic are returned unchanged.
#[must_use]
pub fn stem(token: &str) -> String {
    if token.len() <= MIN_STEM || !token.bytes().all(|b| b.is_ascii_lowercase()) {
        return token.to_string();
    }

    let mut word = token.to_string();

    for &(suffix, replacement) in SUFFIXES {
        let Some(base) = token.strip_suffix(suffix) else {
            continue;
        };
        if suffix == "s" && (base.ends_with('s') || base.ends_with('u') || base.ends_with('i')) {
            break;
        }
        if base.len() + replacement.len() < MIN_STEM {
            continue;
        }

        word = format!("{base}{replacement}");
        if matches!(suffix, "ing" | "ings" | "ed") {
            undouble(&mut word);
        }
        break;
    }

    if word.len() > MIN_STEM && word.ends_with('e') {
        word.pop();
    }
    word
}

/// `running` -> `runn` -> `run`; `ll`, `ss` and `zz` are kept.
fn undouble(word: &mut String) {
    let bytes = word.as_bytes();
    if bytes.len() < 2 {
        return;
    }
    let (a, b) = (bytes[bytes.len() - 2], bytes[bytes.len() - 1]);
    if a == b && !matches!(b, b'a' | b'e' | b'i' | b'o' | b'u' | b'l' | b's' | b'z') {
        word.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflates_inflections() {
        assert_eq!(stem("house"), stem("houses"));
        assert_eq!(stem("solve"), stem("solving"));
        assert_eq!(stem("solve"), stem("solves"));
        assert_eq!(stem("investigates"), "investigat");
        assert_eq!(stem("investigation"), "investigat");
        assert_eq!(stem("investigating"), "investigat");
        assert_eq!(stem("stories"), "story");
        assert_eq!(stem("married"), "marry");
    }

    #[test]
    fn undoubles_after_ing_and_ed() {
        assert_eq!(stem("running"), "run");
        assert_eq!(stem("planned"), "plan");
        assert_eq!(stem("killing"), "kill");
        assert_eq!(stem("killed"), "kill");
    }

    #[test]
    fn leaves_short_and_protected_words() {
        assert_eq!(stem("cat"), "cat");
        assert_eq!(stem("boss"), "boss");
        assert_eq!(stem("bus"), "bus");
        assert_eq!(stem("king"), "king");
        assert_eq!(stem("1984"), "1984");
        assert_eq!(stem("café"), "café");
    }
}
