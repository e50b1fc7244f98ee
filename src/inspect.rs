use std::fmt::{self, Write};
use unicode_general_category::{get_general_category, GeneralCategory};

/// Quotes a lexeme for token dumps, escaping anything that would not show
/// up as itself on a terminal.
pub(crate) fn inspect_lexeme(s: &str) -> LexemeInspector<'_> {
    LexemeInspector(s)
}

pub(crate) struct LexemeInspector<'a>(&'a str);

impl<'a> fmt::Display for LexemeInspector<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for ch in self.0.chars() {
            let esc = match ch {
                '\n' => Some("\\n"),
                '\r' => Some("\\r"),
                '\t' => Some("\\t"),
                '\x0C' => Some("\\f"),
                '\x0B' => Some("\\v"),
                '"' => Some("\\\""),
                '\\' => Some("\\\\"),
                _ => None,
            };
            if let Some(esc) = esc {
                f.write_str(esc)?;
            } else if is_printable(ch) {
                f.write_char(ch)?;
            } else if (ch as u32) < 0x10000 {
                write!(f, "\\u{:04X}", ch as u32)?;
            } else {
                write!(f, "\\u{{{:X}}}", ch as u32)?;
            }
        }
        f.write_str("\"")?;
        Ok(())
    }
}

fn is_printable(ch: char) -> bool {
    match get_general_category(ch) {
        GeneralCategory::UppercaseLetter
        | GeneralCategory::LowercaseLetter
        | GeneralCategory::TitlecaseLetter
        | GeneralCategory::ModifierLetter
        | GeneralCategory::OtherLetter
        | GeneralCategory::NonspacingMark
        | GeneralCategory::SpacingMark
        | GeneralCategory::EnclosingMark
        | GeneralCategory::DecimalNumber
        | GeneralCategory::LetterNumber
        | GeneralCategory::OtherNumber
        | GeneralCategory::ConnectorPunctuation
        | GeneralCategory::DashPunctuation
        | GeneralCategory::OpenPunctuation
        | GeneralCategory::ClosePunctuation
        | GeneralCategory::InitialPunctuation
        | GeneralCategory::FinalPunctuation
        | GeneralCategory::OtherPunctuation
        | GeneralCategory::MathSymbol
        | GeneralCategory::CurrencySymbol
        | GeneralCategory::ModifierSymbol
        | GeneralCategory::OtherSymbol
        | GeneralCategory::SpaceSeparator
        | GeneralCategory::PrivateUse
        | GeneralCategory::Format => true,
        GeneralCategory::LineSeparator
        | GeneralCategory::ParagraphSeparator
        | GeneralCategory::Control
        | GeneralCategory::Surrogate
        | GeneralCategory::Unassigned => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_lexeme() {
        let testcases: Vec<(&str, &str)> = vec![
            ("", "\"\""),
            ("foo", "\"foo\""),
            ("a\"b", "\"a\\\"b\""),
            ("/* open\n", "\"/* open\\n\""),
            ("x\ty\\", "\"x\\ty\\\\\""),
            ("\x00\x07\x1B", "\"\\u0000\\u0007\\u001B\""),
            ("\u{7F}", "\"\\u007F\""),
            ("caf\u{E9}", "\"caf\u{E9}\""),
            ("\u{FFFD}", "\"\u{FFFD}\""),
            ("\u{10000}", "\"\u{10000}\""),
            ("\u{E0001}", "\"\u{E0001}\""),
            ("\u{2028}", "\"\\u2028\""),
        ];
        for (input, expected) in &testcases {
            let result = inspect_lexeme(input).to_string();
            assert_eq!(&*result, *expected, "{:?}", input);
        }
    }
}
