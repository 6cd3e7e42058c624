use std::sync::LazyLock;

use regex::Regex;

/// Templated teaching phrasings, tried in order.
static TEACHING_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?is)^\s*ajari\s+bot\s*:\s*(?P<input>.+?)\s*(?:->|=>)\s*(?P<response>.+?)\s*$",
        r"(?is)^\s*kalo\s+ada\s+yang\s+nanya\s+(?P<input>.+?)\s*,?\s+bilang(?:in)?\s+(?P<response>.+?)\s*$",
        r"(?is)^\s*kalau\s+ada\s+yang\s+tanya\s+(?P<input>.+?)\s*,?\s+jawab\s+(?P<response>.+?)\s*$",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// An owner-taught (input, response) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeachingCommand {
    pub input: String,
    pub response: String,
}

pub fn parse(text: &str) -> Option<TeachingCommand> {
    TEACHING_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let input = caps.name("input")?.as_str().trim();
        let response = caps.name("response")?.as_str().trim();
        if input.is_empty() || response.is_empty() {
            return None;
        }
        Some(TeachingCommand { input: input.to_owned(), response: response.to_owned() })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_form() {
        let t = parse("ajari bot: cara bayar -> transfer ke BCA").unwrap();
        assert_eq!(t.input, "cara bayar");
        assert_eq!(t.response, "transfer ke BCA");
    }

    #[test]
    fn conversational_form() {
        let t = parse("kalo ada yang nanya jam buka, bilang jam 8 pagi sampai 10 malam").unwrap();
        assert_eq!(t.input, "jam buka");
        assert_eq!(t.response, "jam 8 pagi sampai 10 malam");
    }

    #[test]
    fn incomplete_is_none() {
        assert!(parse("ajari bot: cara bayar").is_none());
        assert!(parse("cara bayar -> transfer").is_none());
    }
}
