use crate::{GrammarViolation, ParameterSpec, SpecError, VARIADIC_MARKER};

/// Split a parameter pattern into its tokens.
///
/// A token boundary is a whitespace run immediately preceded by `]` or `>` and
/// immediately followed by `[` or `<`. Whitespace anywhere else stays inside
/// the token, so `"<a> <reason text...>"` yields two tokens.
///
/// A blank pattern yields no tokens.
pub fn split_pattern(pattern: &str) -> Vec<&str> {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return Vec::new();
    }

    let b = pattern.as_bytes();
    let mut tokens = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;
    while i < b.len() {
        if !b[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        let run_start = i;
        while i < b.len() && b[i].is_ascii_whitespace() {
            i += 1;
        }
        let closes = run_start > 0 && matches!(b[run_start - 1], b']' | b'>');
        let opens = i < b.len() && matches!(b[i], b'[' | b'<');
        if closes && opens {
            tokens.push(&pattern[start..run_start]);
            start = i;
        }
    }
    tokens.push(&pattern[start..]);
    tokens
}

/// Compile a parameter pattern into an ordered parameter list.
///
/// Each token is `<name>` (required) or `[name]` (optional); a name ending in
/// `...` marks the parameter variadic. Rules:
///
/// - the wrapper must be a matching pair and the name must be non-empty,
///   else [`SpecError::MalformedParameter`];
/// - once a parameter is optional, all following parameters must be optional,
///   else [`SpecError::InvalidGrammar`];
/// - only the last parameter may be variadic, else [`SpecError::InvalidGrammar`].
pub fn compile_pattern(pattern: &str) -> Result<Vec<ParameterSpec>, SpecError> {
    let tokens = split_pattern(pattern);
    let last = tokens.len().saturating_sub(1);
    let mut params = Vec::with_capacity(tokens.len());
    let mut had_optional = false;

    for (i, token) in tokens.iter().enumerate() {
        let malformed = || SpecError::MalformedParameter {
            token: (*token).to_string(),
        };
        if token.len() < 3 {
            return Err(malformed());
        }

        let optional = match (token.as_bytes()[0], token.as_bytes()[token.len() - 1]) {
            (b'<', b'>') => false,
            (b'[', b']') => true,
            _ => return Err(malformed()),
        };
        if !optional && had_optional {
            return Err(SpecError::InvalidGrammar {
                token: (*token).to_string(),
                violation: GrammarViolation::RequiredAfterOptional,
            });
        }
        had_optional |= optional;

        let mut name = &token[1..token.len() - 1];
        let variadic = match name.strip_suffix(VARIADIC_MARKER) {
            Some(stripped) => {
                if i != last {
                    return Err(SpecError::InvalidGrammar {
                        token: (*token).to_string(),
                        violation: GrammarViolation::VariadicNotLast,
                    });
                }
                name = stripped;
                true
            }
            None => false,
        };
        if name.trim().is_empty() {
            return Err(malformed());
        }

        params.push(ParameterSpec {
            name: name.to_string(),
            optional,
            variadic,
        });
    }

    Ok(params)
}

/// Render parameters back into canonical pattern text.
///
/// `compile_pattern(&render_pattern(p)) == p` for any compiled list `p`.
pub fn render_pattern(params: &[ParameterSpec]) -> String {
    let mut out = String::new();
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let (open, close) = if p.optional { ('[', ']') } else { ('<', '>') };
        out.push(open);
        out.push_str(&p.name);
        if p.variadic {
            out.push_str(VARIADIC_MARKER);
        }
        out.push(close);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── split_pattern ───────────────────────────────────────────────────

    #[test]
    fn split_blank_pattern() {
        assert!(split_pattern("").is_empty());
        assert!(split_pattern("   ").is_empty());
    }

    #[test]
    fn split_on_wrapper_boundaries_only() {
        assert_eq!(split_pattern("<a> [b]"), ["<a>", "[b]"]);
        assert_eq!(split_pattern("<a>\t\t<b>  [c...]"), ["<a>", "<b>", "[c...]"]);
        assert_eq!(split_pattern("<user> [reason text...]"), [
            "<user>",
            "[reason text...]"
        ]);
        // No bracket after the gap, so no boundary.
        assert_eq!(split_pattern("<a> b"), ["<a> b"]);
    }

    // ── compile_pattern ─────────────────────────────────────────────────

    #[test]
    fn compile_blank_is_empty() {
        assert_eq!(compile_pattern("  ").unwrap(), Vec::<ParameterSpec>::new());
    }

    #[test]
    fn compile_required_optional_variadic() {
        let params = compile_pattern("<target> [amount] [note...]").unwrap();
        assert_eq!(params, vec![
            ParameterSpec::required("target"),
            ParameterSpec::optional("amount"),
            ParameterSpec::optional("note").variadic(),
        ]);
    }

    #[test]
    fn compile_required_variadic() {
        let params = compile_pattern("<text...>").unwrap();
        assert_eq!(params, vec![ParameterSpec::required("text").variadic()]);
    }

    #[test]
    fn compile_is_deterministic() {
        let a = compile_pattern("<a> <b> [c]").unwrap();
        let b = compile_pattern("<a> <b> [c]").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn required_after_optional_is_invalid_grammar() {
        let err = compile_pattern("[a] <b>").unwrap_err();
        assert_eq!(err, SpecError::InvalidGrammar {
            token: "<b>".into(),
            violation: GrammarViolation::RequiredAfterOptional,
        });
    }

    #[test]
    fn variadic_not_last_is_invalid_grammar() {
        let err = compile_pattern("<a...> <b>").unwrap_err();
        assert_eq!(err, SpecError::InvalidGrammar {
            token: "<a...>".into(),
            violation: GrammarViolation::VariadicNotLast,
        });
    }

    #[test]
    fn short_or_unwrapped_tokens_are_malformed() {
        for pattern in ["<>", "[]", "a", "<a]", "[a>", "abc", "<...>", "<a> b"] {
            assert!(
                matches!(
                    compile_pattern(pattern),
                    Err(SpecError::MalformedParameter { .. })
                ),
                "pattern {pattern:?} should be malformed"
            );
        }
    }

    #[test]
    fn render_round_trips_counts_and_optionality() {
        for pattern in ["", "<a>", "<a> [b]", "<a> <b> [c...]", "[x] [y...]"] {
            let params = compile_pattern(pattern).unwrap();
            let again = compile_pattern(&render_pattern(&params)).unwrap();
            assert_eq!(params, again, "round trip of {pattern:?}");
        }
    }
}
