use regex::{Regex, RegexBuilder};

/// Drops blank lines and recurring header/footer lines from extracted text
#[derive(Debug, Clone)]
pub struct TextCleaner {
    boilerplate: Vec<Regex>,
}

impl TextCleaner {
    /// Compile boilerplate patterns; matching is case-insensitive
    pub fn new(patterns: &[String]) -> Result<Self, regex::Error> {
        let boilerplate = patterns
            .iter()
            .map(|p| RegexBuilder::new(p).case_insensitive(true).build())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { boilerplate })
    }

    fn is_boilerplate(&self, line: &str) -> bool {
        self.boilerplate.iter().any(|re| re.is_match(line))
    }

    /// Trim every line, keep non-empty lines that match no boilerplate pattern
    pub fn clean(&self, text: &str) -> String {
        text.split(is_line_break)
            .map(str::trim)
            .filter(|line| !line.is_empty() && !self.is_boilerplate(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Clean then collapse all whitespace runs to single spaces
    pub fn clean_and_normalize(&self, text: &str) -> String {
        normalize_whitespace(&self.clean(text))
    }
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}'
            | '\u{2029}'
    )
}

/// Collapse every whitespace run to a single space and trim both ends
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` chars. Returns whether anything was cut.
pub fn truncate_chars(text: &mut String, max_chars: usize) -> bool {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            text.truncate(byte_idx);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_cleaner() -> TextCleaner {
        TextCleaner::new(&[
            r"WWW\.GSGLI\.COM".to_string(),
            r"\bTF(F|B)\s*#\s*\d+".to_string(),
            "state of the art materials".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn test_clean_drops_blank_lines() {
        let cleaner = TextCleaner::new(&[]).unwrap();
        assert_eq!(cleaner.clean("  one \n\n   \n two\r\nthree  "), "one\ntwo\nthree");
    }

    #[test]
    fn test_clean_drops_boilerplate_case_insensitive() {
        let cleaner = default_cleaner();
        let text = "Module 3: Rigging\nwww.gsgli.com\nTFB # 1042 rev 2\nUse a tag line.\nBuilt with State Of The Art Materials";
        assert_eq!(cleaner.clean(text), "Module 3: Rigging\nUse a tag line.");
    }

    #[test]
    fn test_clean_and_normalize() {
        let cleaner = default_cleaner();
        let text = "Title\t  Line\n\nBody   text\u{0c}more";
        assert_eq!(cleaner.clean_and_normalize(text), "Title Line Body text more");
    }

    #[test]
    fn test_clean_only_boilerplate_is_empty() {
        let cleaner = default_cleaner();
        assert_eq!(cleaner.clean_and_normalize("WWW.GSGLI.COM\n\n"), "");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(TextCleaner::new(&["[".to_string()]).is_err());
    }

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n b\t\tc  "), "a b c");
        assert_eq!(normalize_whitespace(""), "");
    }

    #[test]
    fn test_truncate_chars() {
        let mut text = "héllo world".to_string();
        assert!(truncate_chars(&mut text, 5));
        assert_eq!(text, "héllo");

        let mut short = "abc".to_string();
        assert!(!truncate_chars(&mut short, 3));
        assert_eq!(short, "abc");
    }
}
