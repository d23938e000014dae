use std::fmt::{Display, Write as _};

use crate::Severity;

/// An entry of the fixed diagnostic catalogue.
///
/// Templates refer to their arguments positionally as `{0}`, `{1}`, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub severity: Severity,
    template: &'static str,
}

impl DiagnosticMessage {
    pub const TOKEN_EXPECTED: Self =
        Self { code: 1, severity: Severity::Error, template: "Token {0} expected." };
    pub const UNEXPECTED_TOKEN: Self =
        Self { code: 2, severity: Severity::Error, template: "Unexpected token {0}" };
    pub const UNEXPECTED_INDENTATION: Self = Self {
        code: 3,
        severity: Severity::Warning,
        template: "Unexpected indentation: expected {0} columns, found {1}.",
    };
    pub const NON_EMPTY_STRING_EXPECTED: Self =
        Self { code: 5, severity: Severity::Error, template: "Non-empty string expected." };

    pub fn template(&self) -> &'static str {
        self.template
    }

    pub fn format(&self, args: &[&dyn Display]) -> String {
        let mut out = String::with_capacity(self.template.len());
        let mut rest = self.template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];

            let placeholder = after
                .find('}')
                .and_then(|close| Some((after[..close].parse::<usize>().ok()?, close)));

            match placeholder {
                Some((index, close)) => {
                    match args.get(index) {
                        Some(arg) => {
                            let _ = write!(out, "{arg}");
                        }
                        None => out.push_str(&rest[open..open + close + 2]),
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::DiagnosticMessage;

    #[test]
    fn fills_positional_arguments() {
        let message = DiagnosticMessage::UNEXPECTED_INDENTATION.format(&[&2, &4]);
        assert_eq!(message, "Unexpected indentation: expected 2 columns, found 4.");
    }

    #[test]
    fn leaves_unknown_placeholders_alone() {
        let message = DiagnosticMessage::TOKEN_EXPECTED.format(&[]);
        assert_eq!(message, "Token {0} expected.");
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(DiagnosticMessage::TOKEN_EXPECTED.code, 1);
        assert_eq!(DiagnosticMessage::UNEXPECTED_TOKEN.code, 2);
        assert_eq!(DiagnosticMessage::NON_EMPTY_STRING_EXPECTED.code, 5);
    }
}
