//! Invocation parser: recognizes a command prefix and splits key from arguments.

use crate::model::MentionForms;

/// A command candidate extracted from one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation<'a> {
    /// The prefix or mention that introduced the command, as matched.
    pub prefix: &'a str,
    /// Command key, lowercased.
    pub key: String,
    /// Trimmed text after the key.
    pub remainder: &'a str,
}

impl<'a> Invocation<'a> {
    /// Parse `text` against the guild's `prefixes` (tried in order) and the
    /// bot's mention forms (nickname form before plain form).
    ///
    /// Returns `None` when no prefix matches or nothing follows it.
    pub fn parse(text: &'a str, prefixes: &'a [String], mentions: &'a MentionForms) -> Option<Self> {
        let (prefix, rest) = prefixes
            .iter()
            .map(String::as_str)
            .chain([mentions.nickname.as_str(), mentions.plain.as_str()])
            .filter(|p| !p.is_empty())
            .find_map(|p| text.strip_prefix(p).map(|rest| (p, rest)))?;

        let rest = rest.trim();
        let (key, remainder) = match rest.find(char::is_whitespace) {
            Some(end) => (&rest[..end], rest[end..].trim_start()),
            None => (rest, ""),
        };
        if key.is_empty() {
            return None;
        }

        Some(Self {
            prefix,
            key: key.to_lowercase(),
            remainder,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserId;

    fn prefixes(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn prefix_key_and_remainder() {
        let p = prefixes(&["!"]);
        let m = MentionForms::for_user(UserId(9));
        let inv = Invocation::parse("!Purge   10  spam ", &p, &m).unwrap();
        assert_eq!(inv.prefix, "!");
        assert_eq!(inv.key, "purge");
        assert_eq!(inv.remainder, "10  spam");
    }

    #[test]
    fn prefixes_tried_in_order() {
        let p = prefixes(&["bot ", "b"]);
        let m = MentionForms::for_user(UserId(9));
        let inv = Invocation::parse("bot ping", &p, &m).unwrap();
        assert_eq!(inv.prefix, "bot ");
        assert_eq!(inv.key, "ping");
        let inv = Invocation::parse("bping", &p, &m).unwrap();
        assert_eq!(inv.prefix, "b");
        assert_eq!(inv.key, "ping");
    }

    #[test]
    fn mention_forms() {
        let p = prefixes(&["!"]);
        let m = MentionForms::for_user(UserId(9));
        let inv = Invocation::parse("<@9> help", &p, &m).unwrap();
        assert_eq!(inv.prefix, "<@9>");
        assert_eq!(inv.key, "help");
        let inv = Invocation::parse("<@!9>  warn x", &p, &m).unwrap();
        assert_eq!(inv.prefix, "<@!9>");
        assert_eq!(inv.key, "warn");
        assert_eq!(inv.remainder, "x");
    }

    #[test]
    fn not_a_command() {
        let p = prefixes(&["!"]);
        let m = MentionForms::for_user(UserId(9));
        assert_eq!(Invocation::parse("hello", &p, &m), None);
        assert_eq!(Invocation::parse("!", &p, &m), None);
        assert_eq!(Invocation::parse("!   ", &p, &m), None);
        assert_eq!(Invocation::parse("<@9>", &p, &m), None);
        assert_eq!(Invocation::parse("<@10> ping", &p, &m), None);
    }
}
