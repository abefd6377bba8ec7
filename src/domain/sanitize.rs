//! Input sanitation for user-supplied names.

/// Remove HTML tags from `input`, keeping their text content.
///
/// Comments are dropped entirely. Entities are left encoded, so `&lt;b&gt;`
/// stays text. Stripping repeats until no tag is left, which catches tags
/// that only form once an inner tag is gone.
#[must_use]
pub fn strip_html(input: &str) -> String {
    let mut current = strip_tags(input);
    loop {
        let next = strip_tags(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let end = if tail.starts_with("<!--") {
            tail.find("-->").map(|i| i + 3)
        } else if tail[1..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '/' || c == '!') {
            tail.find('>').map(|i| i + 1)
        } else {
            // A bare '<' that does not open a tag is text.
            out.push('<');
            rest = &tail[1..];
            continue;
        };
        match end {
            Some(end) => rest = &tail[end..],
            None => {
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
