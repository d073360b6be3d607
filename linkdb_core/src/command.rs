//! Chat command parsing.

/// Reply lines sent when a lookup finds nothing.
pub const NOT_FOUND: [&str; 2] = ["404", "Not Found"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Delete the channel history down to at most two messages.
    Clear,
    /// Record the URLs of every message in the channel history, deleting each.
    Eatup,
    /// Interactive tagging of every member of `key`.
    Tagging { key: String },
    Get { patterns: Vec<String> },
    Delete { patterns: Vec<String> },
    Set { key: String, values: Vec<String> },
    /// Unrecognized input.
    Noop,
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}

impl Command {
    /// Parse a whitespace-separated command line.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let args: Vec<&str> = text.split_whitespace().collect();

        match args.as_slice() {
            ["/clear"] => Self::Clear,
            ["/eatup"] => Self::Eatup,
            ["/tagging", key] => Self::Tagging {
                key: (*key).to_string(),
            },
            ["/get", patterns @ ..] if !patterns.is_empty() => Self::Get {
                patterns: owned(patterns),
            },
            ["/del", patterns @ ..] if !patterns.is_empty() => Self::Delete {
                patterns: owned(patterns),
            },
            ["/set", key, values @ ..] if !values.is_empty() => Self::Set {
                key: (*key).to_string(),
                values: owned(values),
            },
            _ => Self::Noop,
        }
    }
}
