//! Markup for showing why a key matched.

use dazzle_core::matching::fold_char;

enum Piece<'a> {
    /// Character entity such as `&apos;`, copied through verbatim.
    Entity(&'a str),
    Char(char),
}

/// Wraps the characters of `text` that match `query` in `<b>`…`</b>`.
///
/// Query characters bind greedily leftmost, exactly as they do when the index
/// scores a match, so the markup agrees with the ranking. Character entities
/// already present in the text (`&name;`, `&#NN;`) are passed through
/// untouched and never match; any other `&`, `<` and `>` is escaped. Text that
/// does not contain the query is returned unchanged.
pub fn highlight(text: &str, query: &str, case_sensitive: bool) -> String {
    let pieces = split(text);

    let mut needle = query
        .chars()
        .map(|ch| fold_char(ch, case_sensitive))
        .peekable();
    let mut hits = vec![false; pieces.len()];
    for (piece, hit) in pieces.iter().zip(hits.iter_mut()) {
        let Some(&want) = needle.peek() else {
            break;
        };
        if let Piece::Char(ch) = piece {
            if fold_char(*ch, case_sensitive) == want {
                *hit = true;
                needle.next();
            }
        }
    }
    if needle.peek().is_some() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut open = false;
    for (piece, hit) in pieces.iter().zip(hits) {
        if hit != open {
            out.push_str(if hit { "<b>" } else { "</b>" });
            open = hit;
        }
        match piece {
            Piece::Entity(entity) => out.push_str(entity),
            Piece::Char(ch) => escape_into(&mut out, *ch),
        }
    }
    if open {
        out.push_str("</b>");
    }

    out
}

fn split(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::with_capacity(text.len());
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if let Some(len) = entity_len(rest) {
            pieces.push(Piece::Entity(&rest[..len]));
            rest = &rest[len..];
            continue;
        }
        pieces.push(Piece::Char(ch));
        rest = &rest[ch.len_utf8()..];
    }

    pieces
}

/// Byte length of the entity at the start of `s`, `;` included.
fn entity_len(s: &str) -> Option<usize> {
    let name = s.strip_prefix('&')?;
    let end = name.find(';')?;
    let body = &name[..end];
    let valid = !body.is_empty() && body.chars().all(|c| c.is_ascii_alphanumeric() || c == '#');
    valid.then_some(end + 2)
}

fn escape_into(out: &mut String, ch: char) {
    match ch {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        _ => out.push(ch),
    }
}
