//! Argument tokenizer: binds the text after a command key to its parameters.

use parley_spec::ParameterSpec;
use serde::Serialize;

/// Why an argument string could not be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentError {
    /// A required parameter received no value.
    #[error("too few arguments")]
    TooFewArguments,
    /// Text remained after every parameter was bound.
    #[error("too many arguments")]
    TooManyArguments,
}

/// One parameter paired with the text bound to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundArgument {
    /// The parameter this value was bound to.
    pub param: ParameterSpec,
    /// The raw value.
    pub value: String,
}

/// Ordered parameter → value bindings for one invocation.
///
/// Parameters that received no value are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArgumentBinding {
    values: Vec<BoundArgument>,
}

impl ArgumentBinding {
    /// Value bound to the parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|b| b.param.name == name)
            .map(|b| b.value.as_str())
    }

    /// Value at position `index`.
    pub fn at(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(|b| b.value.as_str())
    }

    /// Number of bound parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was bound.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Bindings in positional order.
    pub fn iter(&self) -> impl Iterator<Item = &BoundArgument> {
        self.values.iter()
    }

    fn push(&mut self, param: &ParameterSpec, value: &str) {
        self.values.push(BoundArgument {
            param: param.clone(),
            value: value.to_string(),
        });
    }
}

/// Returns `true` if `remainder` asks for the command's help (`help` or `?`).
pub fn is_help_request(remainder: &str) -> bool {
    let remainder = remainder.trim();
    remainder.eq_ignore_ascii_case("help") || remainder == "?"
}

/// Cursor over the argument text.
struct Scanner<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Advance past any whitespace run so no empty token is produced.
    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Split off the token before the next whitespace boundary, if there is one.
    fn next_delimited(&mut self) -> Option<&'a str> {
        let rest = self.rest();
        let end = rest.find(char::is_whitespace)?;
        self.pos += end;
        Some(&rest[..end])
    }
}

/// Bind `input` to `params`.
///
/// Tokens are separated by whitespace runs. A variadic parameter captures the
/// remaining text unsplit. A parameter counts as *satisfied* once it is
/// optional, is the last parameter, or is followed by an optional one;
/// running out of input before that is
/// [`ArgumentError::TooFewArguments`], text left over after the last
/// parameter is [`ArgumentError::TooManyArguments`].
///
/// When nothing was supplied and the first parameter is required, the binding
/// is rejected unless `implicit_first_argument` is set (for example, when the
/// message is a reply that stands in for the first argument).
pub fn bind_arguments(
    params: &[ParameterSpec],
    input: &str,
    implicit_first_argument: bool,
) -> Result<ArgumentBinding, ArgumentError> {
    let mut scanner = Scanner::new(input);
    let mut binding = ArgumentBinding::default();
    let mut index = 0usize;
    let mut satisfied = false;

    loop {
        scanner.skip_whitespace();
        if index >= params.len() && !scanner.at_end() {
            return Err(ArgumentError::TooManyArguments);
        }
        if scanner.at_end() {
            break;
        }

        let param = &params[index];
        if param.optional || index + 1 >= params.len() || params[index + 1].optional {
            satisfied = true;
        }

        if param.variadic {
            binding.push(param, scanner.rest().trim_end());
            break;
        }

        match scanner.next_delimited() {
            Some(token) => binding.push(param, token),
            None => {
                if !satisfied {
                    return Err(ArgumentError::TooFewArguments);
                }
                binding.push(param, scanner.rest());
                break;
            }
        }

        index += 1;
    }

    let first_required = params.first().is_some_and(|p| !p.optional);
    if !satisfied && first_required && !implicit_first_argument {
        return Err(ArgumentError::TooFewArguments);
    }

    Ok(binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_spec::compile_pattern;

    fn bind(pattern: &str, input: &str) -> Result<Vec<(String, String)>, ArgumentError> {
        let params = compile_pattern(pattern).unwrap();
        bind_arguments(&params, input, false).map(|b| {
            b.iter()
                .map(|a| (a.param.name.clone(), a.value.clone()))
                .collect()
        })
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn optional_second_parameter_may_be_absent() {
        assert_eq!(bind("<a> [b]", "x"), Ok(pairs(&[("a", "x")])));
    }

    #[test]
    fn missing_required_second_parameter() {
        assert_eq!(bind("<a> <b>", "x"), Err(ArgumentError::TooFewArguments));
    }

    #[test]
    fn variadic_captures_rest_unsplit() {
        assert_eq!(bind("<a...>", "x y z"), Ok(pairs(&[("a", "x y z")])));
        assert_eq!(
            bind("<n> [why...]", "5  spam   and more"),
            Ok(pairs(&[("n", "5"), ("why", "spam   and more")]))
        );
    }

    #[test]
    fn extra_tokens_are_too_many() {
        assert_eq!(bind("<a> <b>", "x y z"), Err(ArgumentError::TooManyArguments));
        assert_eq!(bind("", "x"), Err(ArgumentError::TooManyArguments));
    }

    #[test]
    fn repeated_whitespace_produces_no_empty_tokens() {
        assert_eq!(bind("<a> <b>", "x    y"), Ok(pairs(&[("a", "x"), ("b", "y")])));
        assert_eq!(bind("<a> <b>", "x \t y"), Ok(pairs(&[("a", "x"), ("b", "y")])));
        assert_eq!(bind("<a> <b>", "x   "), Err(ArgumentError::TooFewArguments));
    }

    #[test]
    fn empty_input() {
        assert_eq!(bind("", ""), Ok(vec![]));
        assert_eq!(bind("[a]", ""), Ok(vec![]));
        assert_eq!(bind("<a>", ""), Err(ArgumentError::TooFewArguments));
        assert_eq!(bind("<a> [b]", "   "), Err(ArgumentError::TooFewArguments));
    }

    #[test]
    fn implicit_first_argument_bypasses_empty_rejection() {
        let params = compile_pattern("<user>").unwrap();
        let binding = bind_arguments(&params, "", true).unwrap();
        assert!(binding.is_empty());
        // Only the empty-input rejection is bypassed.
        let params = compile_pattern("<a> <b>").unwrap();
        assert_eq!(
            bind_arguments(&params, "x", true),
            Err(ArgumentError::TooFewArguments)
        );
    }

    #[test]
    fn three_required_parameters() {
        assert_eq!(
            bind("<a> <b> <c>", "1 2 3"),
            Ok(pairs(&[("a", "1"), ("b", "2"), ("c", "3")]))
        );
        assert_eq!(bind("<a> <b> <c>", "1 2"), Err(ArgumentError::TooFewArguments));
        assert_eq!(bind("<a> <b> <c>", "1"), Err(ArgumentError::TooFewArguments));
    }

    #[test]
    fn binding_accessors() {
        let params = compile_pattern("<count> [reason...]").unwrap();
        let binding = bind_arguments(&params, "10 flood", false).unwrap();
        assert_eq!(binding.len(), 2);
        assert_eq!(binding.get("count"), Some("10"));
        assert_eq!(binding.get("reason"), Some("flood"));
        assert_eq!(binding.at(1), Some("flood"));
        assert_eq!(binding.get("missing"), None);
    }

    #[test]
    fn help_requests() {
        assert!(is_help_request("help"));
        assert!(is_help_request("HeLp"));
        assert!(is_help_request("?"));
        assert!(!is_help_request("helpme"));
        assert!(!is_help_request("help me"));
    }
}
