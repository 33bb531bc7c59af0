//! Message text translation.
//!
//! Outbound: the host hands over markup, the core wants NUL-terminated UTF-8
//! and a plain/action distinction. Inbound: the core hands over raw bytes that
//! may carry trailing NULs and invalid UTF-8.

/// Prefix that turns a message into an action.
pub const ACTION_PREFIX: &str = "/me ";

/// How the core should deliver a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Normal message.
    Plain,
    /// Action ("/me") message.
    Action,
}

/// Message ready for the core's send operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    /// Plain or action.
    pub kind: MessageKind,
    /// UTF-8 text with one trailing NUL.
    pub payload: Vec<u8>,
}

impl Outbound {
    /// Build an outbound message from host markup.
    ///
    /// Markup is stripped first; a leading `/me ` (any case) selects an
    /// action and is removed.
    pub fn from_markup(markup: &str) -> Self {
        let text = strip_markup(markup);
        let (kind, body) = match strip_action_prefix(&text) {
            Some(rest) => (MessageKind::Action, rest),
            None => (MessageKind::Plain, text.as_str()),
        };

        let mut payload = Vec::with_capacity(body.len() + 1);
        payload.extend_from_slice(body.as_bytes());
        payload.push(0);
        Self { kind, payload }
    }

    /// Text without the trailing NUL.
    pub fn text(&self) -> String {
        decode_text(&self.payload)
    }
}

fn strip_action_prefix(text: &str) -> Option<&str> {
    let prefix = text.get(..ACTION_PREFIX.len())?;
    prefix.eq_ignore_ascii_case(ACTION_PREFIX).then(|| &text[ACTION_PREFIX.len()..])
}

/// Remove host markup: tags are dropped, `<br>` becomes a newline and
/// common character entities are decoded.
pub fn strip_markup(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;

    while let Some(pos) = rest.find(['<', '&']) {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        if rest.starts_with('<') {
            let Some(end) = rest.find('>') else {
                break;
            };
            if is_line_break(&rest[1..end]) {
                out.push('\n');
            }
            rest = &rest[end + 1..];
        } else if let Some((ch, len)) = decode_entity(rest) {
            out.push(ch);
            rest = &rest[len..];
        } else {
            out.push('&');
            rest = &rest[1..];
        }
    }

    out.push_str(rest);
    out
}

fn is_line_break(tag: &str) -> bool {
    tag.split(|c: char| c.is_whitespace() || c == '/')
        .find(|part| !part.is_empty())
        .is_some_and(|name| name.eq_ignore_ascii_case("br"))
}

// `text` starts with '&'. Returns the character and the entity's byte length.
fn decode_entity(text: &str) -> Option<(char, usize)> {
    let end = text.char_indices().take(12).find(|&(_, c)| c == ';').map(|(i, _)| i)?;
    let name = &text[1..end];

    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse().ok()?,
            };
            char::from_u32(code)?
        },
    };

    Some((ch, end + 1))
}

/// Text of a raw core payload: trailing NULs trimmed, invalid UTF-8 replaced.
pub fn decode_text(raw: &[u8]) -> String {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// Host text for an inbound message.
pub fn inbound_text(kind: MessageKind, raw: &[u8]) -> String {
    let text = decode_text(raw);
    match kind {
        MessageKind::Plain => text,
        MessageKind::Action => format!("{ACTION_PREFIX}{text}"),
    }
}
