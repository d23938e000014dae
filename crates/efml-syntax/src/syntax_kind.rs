use std::fmt;

#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum SyntaxKind {
    GREATER_THAN,
    HASH,
    PERCENT,
    AT,
    DOT,
    BAR,
    PLUS,
    MINUS,
    EQ,
    COLON,
    MUSTACHE_START,
    MUSTACHE_END,
    TEXT_FRAGMENT,

    WHITESPACE,
    NEW_LINE,
    COMMENT,
    EOF,
    UNKNOWN,

    STRING_LITERAL,

    SOURCE_FILE,
    COMMENT_LINE,
    ELEMENT_DECLARATION,
    ATTRIBUTE_OR_PROPERTY,
    EVENT_HANDLER,
    TEXT_LINE,
    MOUNTING_POINT,

    TAG_DESCRIPTOR,
    TEMPLATE_STRING,
    MUSTACHE,
    DOTTED_CHAIN,
}

impl SyntaxKind {
    pub const fn is_token(self) -> bool {
        self as u8 <= Self::UNKNOWN as u8
    }

    /// Indentation, line breaks and comment text.
    pub const fn is_trivia(self) -> bool {
        matches!(self, Self::WHITESPACE | Self::NEW_LINE | Self::COMMENT)
    }

    pub const fn is_line(self) -> bool {
        matches!(
            self,
            Self::COMMENT_LINE
                | Self::ELEMENT_DECLARATION
                | Self::ATTRIBUTE_OR_PROPERTY
                | Self::EVENT_HANDLER
                | Self::TEXT_LINE
                | Self::MOUNTING_POINT
        )
    }

    pub const fn sigil(self) -> Option<&'static str> {
        Some(match self {
            Self::GREATER_THAN => ">",
            Self::HASH => "#",
            Self::PERCENT => "%",
            Self::AT => "@",
            Self::DOT => ".",
            Self::BAR => "|",
            Self::PLUS => "+",
            Self::MINUS => "-",
            Self::EQ => "=",
            Self::COLON => ":",
            Self::MUSTACHE_START => "{{",
            Self::MUSTACHE_END => "}}",
            _ => return None,
        })
    }
}

impl fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sigil) = self.sigil() {
            return write!(f, "'{sigil}'");
        }

        f.write_str(match self {
            Self::TEXT_FRAGMENT => "text",
            Self::WHITESPACE => "indentation",
            Self::NEW_LINE => "line break",
            Self::COMMENT => "comment",
            Self::EOF => "end of file",
            Self::UNKNOWN => "unknown",
            Self::STRING_LITERAL => "string literal",
            _ => return write!(f, "{self:?}"),
        })
    }
}
