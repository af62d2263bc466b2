//! Pattern notation and its compiler.
//!
//! Patterns are written once, at registration, and compiled into a small
//! tree the matcher walks:
//!
//! | Notation      | Meaning                                              |
//! |---------------|------------------------------------------------------|
//! | `text`        | literal, matched case-insensitively                  |
//! | whitespace    | a word boundary                                      |
//! | `[...]`       | optional group                                       |
//! | `(a\|b)`      | alternatives, tried left to right                    |
//! | `N¦`          | at the start of a group: XOR `N` into the mark       |
//! | `%type%`      | typed placeholder (see [`SlotInfo`])                 |
//! | `%type%s`     | placeholder accepting several values                 |
//! | `<regex>`     | inline regex; its groups are recorded                |
//! | `\x`          | `x` literally                                        |

use regex::Regex;
use thiserror::Error;

use crate::slot::SlotInfo;
use crate::types::TypeSystem;

/// A malformed pattern. Fatal only to the registration it belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A group or placeholder was never closed.
    #[error("missing closing '{close}' for '{open}' at position {at}")]
    Unclosed {
        /// Opening character.
        open: char,
        /// Expected closing character.
        close: char,
        /// Position of the opening character.
        at: usize,
    },
    /// A character that is not valid at this position.
    #[error("unexpected '{ch}' at position {at}")]
    Unexpected {
        /// The character.
        ch: char,
        /// Its position.
        at: usize,
    },
    /// A placeholder that does not parse.
    #[error("invalid placeholder '%{slot}%': {reason}")]
    InvalidSlot {
        /// Placeholder content.
        slot: String,
        /// What is wrong with it.
        reason: String,
    },
    /// A placeholder names a type that is not registered.
    #[error("unknown type '{name}'")]
    UnknownType {
        /// The type name.
        name: String,
    },
    /// An inline regex that does not compile.
    #[error("invalid regex <{regex}>: {reason}")]
    InvalidRegex {
        /// Regex source.
        regex: String,
        /// Compiler message.
        reason: String,
    },
    /// A trailing backslash.
    #[error("pattern ends with an escape character")]
    DanglingEscape,
    /// A pattern that can only match the empty string.
    #[error("empty pattern")]
    Empty,
}

/// A compiled pattern element.
#[derive(Clone, Debug)]
pub(crate) enum Node {
    /// Literal characters, lowercased.
    Text(Vec<char>),
    /// A word boundary.
    Space,
    /// An optional group with its mark.
    Optional { mark: i32, nodes: Vec<Node> },
    /// Alternatives.
    Choice(Vec<Branch>),
    /// A placeholder, by slot index.
    Slot(usize),
    /// An inline regex, by regex index.
    Regex(usize),
}

/// One alternative of a choice group.
#[derive(Clone, Debug)]
pub(crate) struct Branch {
    pub(crate) mark: i32,
    pub(crate) nodes: Vec<Node>,
}

/// A compiled pattern.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    nodes: Vec<Node>,
    slots: Vec<SlotInfo>,
    regexes: Vec<Regex>,
}

impl Pattern {
    /// Compiles a pattern, resolving type names against `types`.
    pub fn compile(source: &str, types: &TypeSystem) -> Result<Self, PatternError> {
        let mut compiler = Compiler {
            chars: source.chars().collect(),
            pos: 0,
            types,
            slots: Vec::new(),
            regexes: Vec::new(),
        };
        let nodes = compiler.sequence(&[])?;
        if let Some(&ch) = compiler.chars.get(compiler.pos) {
            return Err(PatternError::Unexpected {
                ch,
                at: compiler.pos,
            });
        }
        if nodes.iter().all(|n| matches!(n, Node::Space)) {
            return Err(PatternError::Empty);
        }
        Ok(Self {
            source: source.to_string(),
            nodes,
            slots: compiler.slots,
            regexes: compiler.regexes,
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The placeholders, left to right.
    #[must_use]
    pub fn slots(&self) -> &[SlotInfo] {
        &self.slots
    }

    /// Number of placeholders.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub(crate) fn regex(&self, index: usize) -> Option<&Regex> {
        self.regexes.get(index)
    }
}

struct Compiler<'a> {
    chars: Vec<char>,
    pos: usize,
    types: &'a TypeSystem,
    slots: Vec<SlotInfo>,
    regexes: Vec<Regex>,
}

impl Compiler<'_> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Parses elements until end of input or one of `stop` (not consumed).
    fn sequence(&mut self, stop: &[char]) -> Result<Vec<Node>, PatternError> {
        let mut nodes: Vec<Node> = Vec::new();
        while let Some(ch) = self.peek() {
            if stop.contains(&ch) {
                break;
            }
            match ch {
                c if c.is_whitespace() => {
                    self.pos += 1;
                    if !matches!(nodes.last(), Some(Node::Space)) {
                        nodes.push(Node::Space);
                    }
                }
                '[' => {
                    let mut branches = self.alternatives('[', ']')?;
                    let node = if branches.len() == 1 {
                        let Branch { mark, nodes } = branches.remove(0);
                        Node::Optional { mark, nodes }
                    } else {
                        Node::Optional {
                            mark: 0,
                            nodes: vec![Node::Choice(branches)],
                        }
                    };
                    nodes.push(node);
                }
                '(' => {
                    let branches = self.alternatives('(', ')')?;
                    nodes.push(Node::Choice(branches));
                }
                '%' => {
                    let slot = self.slot()?;
                    nodes.push(Node::Slot(slot));
                }
                '<' => {
                    let regex = self.regex()?;
                    nodes.push(Node::Regex(regex));
                }
                '\\' => {
                    let escaped = self
                        .chars
                        .get(self.pos + 1)
                        .copied()
                        .ok_or(PatternError::DanglingEscape)?;
                    self.pos += 2;
                    push_text(&mut nodes, escaped);
                }
                ']' | ')' | '|' | '¦' => {
                    return Err(PatternError::Unexpected { ch, at: self.pos });
                }
                c => {
                    self.pos += 1;
                    push_text(&mut nodes, c);
                }
            }
        }
        Ok(nodes)
    }

    /// Parses `|`-separated branches up to and including `close`.
    fn alternatives(&mut self, open: char, close: char) -> Result<Vec<Branch>, PatternError> {
        let at = self.pos;
        self.pos += 1;
        let mut branches = Vec::new();
        loop {
            let mark = self.mark()?;
            let nodes = self.sequence(&['|', close])?;
            branches.push(Branch { mark, nodes });
            match self.peek() {
                Some('|') => self.pos += 1,
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(branches);
                }
                _ => return Err(PatternError::Unclosed { open, close, at }),
            }
        }
    }

    /// Parses an optional `N¦` prefix at the start of a group.
    fn mark(&mut self) -> Result<i32, PatternError> {
        let mut end = self.pos;
        if self.chars.get(end) == Some(&'-') {
            end += 1;
        }
        let digits_start = end;
        while self.chars.get(end).is_some_and(char::is_ascii_digit) {
            end += 1;
        }
        if end == digits_start || self.chars.get(end) != Some(&'¦') {
            return Ok(0);
        }
        let text: String = self.chars[self.pos..end].iter().collect();
        let mark = text.parse::<i32>().map_err(|_| PatternError::Unexpected {
            ch: '¦',
            at: end,
        })?;
        self.pos = end + 1;
        Ok(mark)
    }

    fn slot(&mut self) -> Result<usize, PatternError> {
        let open = self.pos;
        let start = open + 1;
        let end = (start..self.chars.len())
            .find(|&i| self.chars[i] == '%')
            .ok_or(PatternError::Unclosed {
                open: '%',
                close: '%',
                at: open,
            })?;
        let content: String = self.chars[start..end].iter().collect();
        let mut slot = SlotInfo::parse(&content, self.types)?;
        self.pos = end + 1;
        if self.peek() == Some('s') {
            self.pos += 1;
            slot.make_plural();
        }
        self.slots.push(slot);
        Ok(self.slots.len() - 1)
    }

    fn regex(&mut self) -> Result<usize, PatternError> {
        let open = self.pos;
        let mut source = String::new();
        let mut i = open + 1;
        loop {
            match self.chars.get(i) {
                None => {
                    return Err(PatternError::Unclosed {
                        open: '<',
                        close: '>',
                        at: open,
                    });
                }
                Some('\\') if self.chars.get(i + 1) == Some(&'>') => {
                    source.push('>');
                    i += 2;
                }
                Some('>') => break,
                Some(&c) => {
                    source.push(c);
                    i += 1;
                }
            }
        }
        self.pos = i + 1;
        let regex = Regex::new(&format!("(?i)^(?:{source})$")).map_err(|e| {
            PatternError::InvalidRegex {
                regex: source.clone(),
                reason: e.to_string(),
            }
        })?;
        self.regexes.push(regex);
        Ok(self.regexes.len() - 1)
    }
}

fn push_text(nodes: &mut Vec<Node>, c: char) {
    let lower = c.to_lowercase().next().unwrap_or(c);
    if let Some(Node::Text(text)) = nodes.last_mut() {
        text.push(lower);
    } else {
        nodes.push(Node::Text(vec![lower]));
    }
}
