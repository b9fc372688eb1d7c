//! Incoming user message with its normalized view.

/// Raw user text plus the lower-cased form every detector reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    raw: String,
    normalized: String,
}

impl Message {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let normalized = normalize(&raw);
        Self { raw, normalized }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Lower-cases and folds typographic apostrophes so `don’t` matches `don't`.
/// Whitespace is kept as typed: the memory prefixes rely on a trailing space.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_view_is_lowercase() {
        let m = Message::new("I Can’t Sleep");
        assert_eq!(m.raw(), "I Can’t Sleep");
        assert_eq!(m.normalized(), "i can't sleep");
    }

    #[test]
    fn trailing_space_survives() {
        assert_eq!(normalize("Remember "), "remember ");
    }
}
