//! Balanced scanning of source text.
//!
//! Quoted strings (`"..."`, with `""` as an escaped quote), variables
//! (`{...}`) and parenthesised groups are opaque: a placeholder never ends
//! inside one, and list separators inside one do not count.

/// Tracks nesting while scanning.
#[derive(Default)]
struct Scanner {
    parens: usize,
    braces: usize,
    in_string: bool,
}

enum Step {
    /// Consumed one character.
    One,
    /// Consumed an escaped quote (two characters).
    Two,
    /// A closer without opener.
    Unbalanced,
}

impl Scanner {
    fn step(&mut self, c: char, next: Option<char>) -> Step {
        if self.in_string {
            if c == '"' {
                if next == Some('"') {
                    return Step::Two;
                }
                self.in_string = false;
            }
            return Step::One;
        }
        match c {
            '"' => self.in_string = true,
            '(' => self.parens += 1,
            '{' => self.braces += 1,
            ')' => match self.parens.checked_sub(1) {
                Some(d) => self.parens = d,
                None => return Step::Unbalanced,
            },
            '}' => match self.braces.checked_sub(1) {
                Some(d) => self.braces = d,
                None => return Step::Unbalanced,
            },
            _ => {}
        }
        Step::One
    }

    fn at_top(&self) -> bool {
        !self.in_string && self.parens == 0 && self.braces == 0
    }
}

/// Every position a placeholder starting at `start` may end at, ascending.
///
/// A span is a candidate if it is balanced and neither starts nor ends with
/// whitespace.
pub(crate) fn slot_ends(chars: &[char], start: usize) -> Vec<usize> {
    let mut ends = Vec::new();
    if chars.get(start).is_none_or(|c| c.is_whitespace()) {
        return ends;
    }
    let mut scanner = Scanner::default();
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        match scanner.step(c, chars.get(i + 1).copied()) {
            Step::Unbalanced => break,
            Step::Two => {
                i += 2;
                continue;
            }
            Step::One => {}
        }
        i += 1;
        if scanner.at_top() && !c.is_whitespace() {
            ends.push(i);
        }
    }
    ends
}

/// If `text` is exactly one quoted string, returns its raw content.
pub(crate) fn quoted(text: &str) -> Option<&str> {
    let inner = text.strip_prefix('"')?.strip_suffix('"')?;
    if text.len() < 2 {
        return None;
    }
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
            } else {
                return None;
            }
        }
    }
    Some(inner)
}

/// Replaces `""` with `"`.
pub(crate) fn unescape_quotes(raw: &str) -> String {
    raw.replace("\"\"", "\"")
}

/// If `text` is exactly one `open ... close` group, returns its content.
pub(crate) fn enclosed(text: &str, open: char, close: char) -> Option<&str> {
    let inner = text.strip_prefix(open)?.strip_suffix(close)?;
    let mut scanner = Scanner::default();
    let chars: Vec<char> = inner.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match scanner.step(chars[i], chars.get(i + 1).copied()) {
            Step::Unbalanced => return None,
            Step::Two => i += 2,
            Step::One => i += 1,
        }
    }
    scanner.at_top().then_some(inner)
}

/// A top-level list separator.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Separator {
    Comma,
    And,
    Or,
    Nor,
}

/// A list split at its top-level separators.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ListSplit {
    /// Byte ranges of the trimmed members.
    pub(crate) pieces: Vec<(usize, usize)>,
    /// Separator between piece `i` and `i + 1`.
    pub(crate) separators: Vec<Separator>,
}

fn word_at(text: &str, at: usize) -> Option<(Separator, usize)> {
    let rest = &text[at..];
    for (word, sep) in [("and", Separator::And), ("nor", Separator::Nor), ("or", Separator::Or)] {
        let Some(head) = rest.get(..word.len()) else {
            continue;
        };
        let followed_by_space = rest[word.len()..]
            .chars()
            .next()
            .is_some_and(char::is_whitespace);
        if head.eq_ignore_ascii_case(word) && followed_by_space {
            return Some((sep, word.len()));
        }
    }
    None
}

/// Splits `text` at top-level `,`, `and`, `or` and `nor`. Returns `None`
/// if there is no separator or a member would be empty.
pub(crate) fn split_list(text: &str) -> Option<ListSplit> {
    let mut raw: Vec<(Separator, usize, usize)> = Vec::new();
    let mut scanner = Scanner::default();
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut i = 0;
    while i < chars.len() {
        let (at, c) = chars[i];
        let top_before = scanner.at_top();
        match scanner.step(c, chars.get(i + 1).map(|&(_, c)| c)) {
            Step::Unbalanced => return None,
            Step::Two => {
                i += 2;
                continue;
            }
            Step::One => {}
        }
        if top_before {
            let after_space = i > 0 && chars[i - 1].1.is_whitespace();
            if c == ',' {
                raw.push((Separator::Comma, at, at + 1));
            } else if after_space {
                if let Some((sep, len)) = word_at(text, at) {
                    raw.push((sep, at, at + len));
                    i += len;
                    continue;
                }
            }
        }
        i += 1;
    }
    if raw.is_empty() {
        return None;
    }

    // ", and" counts as one "and".
    let mut merged: Vec<(Separator, usize, usize)> = Vec::new();
    for (sep, start, end) in raw {
        if let Some(last) = merged.last_mut() {
            if last.0 == Separator::Comma
                && sep != Separator::Comma
                && text[last.2..start].trim().is_empty()
            {
                *last = (sep, last.1, end);
                continue;
            }
        }
        merged.push((sep, start, end));
    }

    let mut pieces = Vec::new();
    let mut from = 0;
    for &(_, start, end) in &merged {
        pieces.push(trimmed_range(text, from, start)?);
        from = end;
    }
    pieces.push(trimmed_range(text, from, text.len())?);
    Some(ListSplit {
        pieces,
        separators: merged.into_iter().map(|(sep, _, _)| sep).collect(),
    })
}

fn trimmed_range(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trail = slice.len() - slice.trim_end().len();
    (lead + trail < slice.len()).then(|| (start + lead, end - trail))
}

/// A piece of a `%...%` template.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    /// Literal text, with `%%` unescaped.
    Text(String),
    /// The source of an embedded expression.
    Expr(&'a str),
}

/// Splits template text into literal text and `%expression%` parts.
pub(crate) fn template_segments(content: &str) -> Result<Vec<Segment<'_>>, String> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut iter = content.char_indices().peekable();
    while let Some((at, c)) = iter.next() {
        if c != '%' {
            text.push(c);
            continue;
        }
        if iter.peek().is_some_and(|&(_, n)| n == '%') {
            iter.next();
            text.push('%');
            continue;
        }
        let start = at + 1;
        let mut depth = 0_usize;
        let mut end = None;
        for (j, n) in iter.by_ref() {
            match n {
                '{' | '(' => depth += 1,
                '}' | ')' => depth = depth.saturating_sub(1),
                '%' if depth == 0 => {
                    end = Some(j);
                    break;
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| format!("'{content}' has an unclosed '%'"))?;
        if !text.is_empty() {
            segments.push(Segment::Text(std::mem::take(&mut text)));
        }
        segments.push(Segment::Expr(content[start..end].trim()));
    }
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}
