use efml_syntax::{NodeData, SourceFile};

use super::{content_range, leaf_text};
use crate::extended_protocol::InlayHint;

/// Labels numeric event modifiers with the key they stand for, as in
/// `@keydown.13 = submit`.
pub(crate) fn inlay_hints(file: &SourceFile) -> Vec<InlayHint> {
    let mut hints = Vec::new();

    for handler in file.find_all(|node| matches!(node.data, NodeData::EventHandler(_))) {
        let NodeData::EventHandler(line) = &file[handler].data else { continue };
        let Some((_, chain)) = line.modifiers else { continue };
        let NodeData::DottedChain(chain) = &file[chain].data else { continue };

        for segment in chain.segments() {
            let Some(name) = leaf_text(file, segment).parse().ok().and_then(key_name) else {
                continue;
            };
            hints.push(InlayHint {
                position: content_range(file, segment).start,
                label: format!("{name} :"),
            });
        }
    }

    hints
}

/// The name of a legacy `KeyboardEvent.keyCode`.
pub fn key_name(code: u32) -> Option<String> {
    let name = match code {
        3 => "CANCEL",
        6 => "HELP",
        8 => "BACK_SPACE",
        9 => "TAB",
        12 => "CLEAR",
        13 => "ENTER",
        16 => "SHIFT",
        17 => "CONTROL",
        18 => "ALT",
        19 => "PAUSE",
        20 => "CAPS_LOCK",
        21 => "KANA",
        25 => "KANJI",
        27 => "ESCAPE",
        28 => "CONVERT",
        29 => "NONCONVERT",
        32 => "SPACE",
        33 => "PAGE_UP",
        34 => "PAGE_DOWN",
        35 => "END",
        36 => "HOME",
        37 => "LEFT",
        38 => "UP",
        39 => "RIGHT",
        40 => "DOWN",
        41 => "SELECT",
        42 => "PRINT",
        43 => "EXECUTE",
        44 => "PRINTSCREEN",
        45 => "INSERT",
        46 => "DELETE",
        48..=57 | 65..=90 => return char::from_u32(code).map(String::from),
        91 => "OS_KEY",
        93 => "CONTEXT_MENU",
        95 => "SLEEP",
        96..=105 => return Some(format!("NUMPAD{}", code - 96)),
        106 => "MULTIPLY",
        107 => "ADD",
        108 => "SEPARATOR",
        109 => "SUBTRACT",
        110 => "DECIMAL",
        111 => "DIVIDE",
        112..=135 => return Some(format!("F{}", code - 111)),
        144 => "NUM_LOCK",
        145 => "SCROLL_LOCK",
        186 => "SEMICOLON",
        187 => "EQUALS",
        188 => "COMMA",
        189 => "MINUS",
        190 => "PERIOD",
        191 => "SLASH",
        192 => "BACK_QUOTE",
        219 => "OPEN_BRACKET",
        220 => "BACK_SLASH",
        221 => "CLOSE_BRACKET",
        222 => "QUOTE",
        224 => "META",
        225 => "ALTGR",
        _ => return None,
    };
    Some(name.to_owned())
}
