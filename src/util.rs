pub(crate) trait OptionPredExt<T> {
    fn is_some_and_<F>(&self, pred: F) -> bool
    where
        F: FnOnce(&T) -> bool;
}

impl<T> OptionPredExt<T> for Option<T> {
    fn is_some_and_<F>(&self, pred: F) -> bool
    where
        F: FnOnce(&T) -> bool,
    {
        if let Some(x) = self {
            pred(x)
        } else {
            false
        }
    }
}

pub(crate) trait CharExt {
    /// C's `isspace`; unlike `is_ascii_whitespace` it includes `\v`.
    fn isspace(&self) -> bool;

    /// Whether a word or number may be immediately followed by this byte.
    fn is_word_follower(&self) -> bool;
}

impl CharExt for u8 {
    fn isspace(&self) -> bool {
        matches!(*self, b' ' | b'\t' | b'\n' | b'\x0B' | b'\x0C' | b'\r')
    }

    fn is_word_follower(&self) -> bool {
        self.isspace()
            || matches!(
                *self,
                b'&' | b'|'
                    | b'!'
                    | b'+'
                    | b'-'
                    | b'*'
                    | b'/'
                    | b'%'
                    | b'^'
                    | b'='
                    | b'<'
                    | b'>'
                    | b'('
                    | b')'
                    | b'{'
                    | b'}'
                    | b'['
                    | b']'
                    | b','
                    | b':'
                    | b';'
            )
    }
}

/// End of input also ends a word.
pub(crate) fn ends_word(next: Option<u8>) -> bool {
    match next {
        None => true,
        Some(ch) => ch.is_word_follower(),
    }
}
