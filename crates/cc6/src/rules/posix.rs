//! POSIX regular expressions as published in CMOR CV tables.
//!
//! CMOR CVs write patterns in POSIX basic syntax, e.g.
//! `r[[:digit:]]\{1,\}i[[:digit:]]\{1,\}p[[:digit:]]\{1,\}f[[:digit:]]\{1,\}$`.

const CHARACTER_CLASSES: &[(&str, &str)] = &[
    ("[[:alnum:]]", "[a-zA-Z0-9]"),
    ("[[:alpha:]]", "[a-zA-Z]"),
    ("[[:digit:]]", r"\d"),
    ("[[:xdigit:]]", "[0-9a-fA-F]"),
    ("[[:lower:]]", "[a-z]"),
    ("[[:upper:]]", "[A-Z]"),
    ("[[:blank:]]", r"[ \t]"),
    ("[[:space:]]", r"\s"),
    ("[[:punct:]]", r##"[!"#$%&'()*+,\-./:;<=>?@\[\\\]^_`{|}~]"##),
    ("[[:word:]]", r"\w"),
];

/// Convert a POSIX basic regular expression into `regex` crate syntax.
///
/// Bracketed character classes are replaced, `\{1,\}` becomes `+` and other
/// escaped interval braces lose their escapes. Anything else is kept as is.
pub fn convert_posix_to_rust(posix: &str) -> String {
    let mut converted = posix.to_string();
    for (class, replacement) in CHARACTER_CLASSES {
        converted = converted.replace(class, replacement);
    }
    converted
        .replace(r"\{1,\}", "+")
        .replace(r"\{", "{")
        .replace(r"\}", "}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn test_digit() {
        assert_eq!(convert_posix_to_rust("[[:digit:]]"), r"\d");
    }

    #[test]
    fn test_alnum_and_word() {
        assert_eq!(convert_posix_to_rust("[[:alnum:]]"), "[a-zA-Z0-9]");
        assert_eq!(convert_posix_to_rust("[[:word:]]"), r"\w");
    }

    #[test]
    fn test_quantifier() {
        assert_eq!(convert_posix_to_rust(r"[[:digit:]]\{1,\}"), r"\d+");
        assert_eq!(convert_posix_to_rust(r"[[:digit:]]\{2,4\}"), r"\d{2,4}");
    }

    #[test]
    fn test_variant_label() {
        let converted = convert_posix_to_rust(
            r"r[[:digit:]]\{1,\}i[[:digit:]]\{1,\}p[[:digit:]]\{1,\}f[[:digit:]]\{1,\}$",
        );
        assert_eq!(converted, r"r\d+i\d+p\d+f\d+$");
    }

    #[test]
    fn test_no_conversion_needed() {
        assert_eq!(convert_posix_to_rust(r"\d+hello[a-zA-Z0-9]"), r"\d+hello[a-zA-Z0-9]");
        assert_eq!(convert_posix_to_rust(""), "");
    }

    #[test]
    fn test_mixed() {
        assert_eq!(
            convert_posix_to_rust(r"[[:alnum:]]+[[:digit:]]\{1,\}[[:space:]]+hello"),
            r"[a-zA-Z0-9]+\d+\s+hello"
        );
    }

    #[test]
    fn test_punct_compiles() {
        let re = Regex::new(&format!("^{}$", convert_posix_to_rust("[[:punct:]]"))).unwrap();
        assert!(re.is_match("["));
        assert!(re.is_match("~"));
        assert!(!re.is_match("a"));
    }
}
