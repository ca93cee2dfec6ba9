//! One-line frame summaries for the `vellum` command.
//!
//! Every frame prints as `Frame <ID>` followed by `: <summary>` when its
//! payload has something short worth showing.

use vellum_proto::{Frame, Payload, Tag};

/// Summary of a frame's payload, if its variant has one.
#[must_use]
pub fn summary(frame: &Frame) -> Option<String> {
    match &frame.payload {
        Payload::Picture(p) => Some(format!(
            "#{} {}[{}] ({} bytes)",
            p.picture_type.to_byte(),
            p.description,
            p.mime_type,
            p.data.len()
        )),
        Payload::Text(t) => Some(t.joined(" - ")),
        Payload::UserText(t) => Some(format!("{} -> {}", t.description, shown(&t.value))),
        Payload::UniqueFileId(u) => {
            Some(format!("{} -> {}", u.owner, String::from_utf8_lossy(&u.identifier)))
        },
        Payload::Lyrics(l) | Payload::Comment(l) => {
            Some(format!("[{}:{}] {}", l.language, l.description, shown(&l.text)))
        },
        Payload::Unknown(data) => Some(format!("({} bytes)", data.len())),
        Payload::Url(_) | Payload::UserUrl(_) | Payload::Popularimeter(_) => None,
    }
}

/// Final strings keep a wire terminator as a trailing `'\0'`.
fn shown(text: &str) -> &str {
    text.strip_suffix('\0').unwrap_or(text)
}

/// `Frame <ID>[: <summary>]`
#[must_use]
pub fn describe(frame: &Frame) -> String {
    match summary(frame) {
        Some(summary) => format!("Frame {}: {summary}", frame.id()),
        None => format!("Frame {}", frame.id()),
    }
}

/// One line per frame, in wire order.
pub fn lines(tag: &Tag) -> impl Iterator<Item = String> + '_ {
    tag.frames.iter().map(describe)
}
