use efml_syntax::SyntaxKind::{self, *};

pub fn is_line_break(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Whitespace that does not end a line.
pub fn is_same_line_whitespace(ch: char) -> bool {
    matches!(
        ch,
        ' ' | '\t'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{00A0}'
            | '\u{0085}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200B}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

pub(crate) fn single_char_token(ch: char) -> Option<SyntaxKind> {
    Some(match ch {
        '>' => GREATER_THAN,
        '#' => HASH,
        '%' => PERCENT,
        '@' => AT,
        '.' => DOT,
        '|' => BAR,
        '+' => PLUS,
        '-' => MINUS,
        '=' => EQ,
        ':' => COLON,
        _ => return None,
    })
}

/// Characters that may open a line grammar.
pub(crate) fn can_start_line(ch: char) -> bool {
    matches!(ch, '>' | '#' | '%' | '@' | '.' | '|' | '+' | '-')
}

fn is_brace(ch: char) -> bool {
    matches!(ch, '{' | '}')
}

/// Characters that end a text fragment.
pub(crate) fn is_token_start(ch: char) -> bool {
    single_char_token(ch).is_some() || is_brace(ch) || is_line_break(ch)
}

