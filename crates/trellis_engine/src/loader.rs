//! Script loading.
//!
//! A script is UTF-8 text structured by indentation. `#` starts a comment
//! unless it is inside quotes or braces (`##` writes a literal `#`), blank
//! lines are ignored, and a line ending in `:` opens a section whose body is
//! the more-indented lines below it. Tabs count as four spaces.
//!
//! Every top-level section must be a trigger, `on <event>:`. Problems are
//! reported per line and only drop the offending line or section; the rest
//! of the script still loads.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};
use trellis_parser::{RegistryError, SyntaxParser};

use crate::builder::{Built, TriggerBuilder};
use crate::control::ControlSyntaxes;
use crate::graph::Trigger;

// =============================================================================
// Diagnostics
// =============================================================================

/// A line that could not be loaded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct LoadError {
    /// 1-based line number.
    pub line: usize,
    /// What went wrong.
    pub message: String,
}

/// A non-fatal remark about a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadWarning {
    /// 1-based line number.
    pub line: usize,
    /// The remark.
    pub message: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

// =============================================================================
// Lines
// =============================================================================

/// One logical line with the lines nested under it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// The text without indentation, comment, or trailing `:`.
    pub text: String,
    /// 1-based line number.
    pub number: usize,
    /// True if the line ended in `:`.
    pub section: bool,
    /// The body, for sections.
    pub children: Vec<Line>,
}

impl Line {
    fn new(text: &str, number: usize) -> Self {
        let (text, section) = match text.strip_suffix(':') {
            Some(header) => (header.trim_end(), true),
            None => (text, false),
        };
        Self {
            text: text.to_string(),
            number,
            section,
            children: Vec::new(),
        }
    }
}

const TAB_WIDTH: usize = 4;

struct Frame {
    indent: usize,
    lines: Vec<Line>,
}

/// Splits script text into a tree of lines. Indentation errors are returned
/// alongside; the lines they concern are dropped.
#[must_use]
pub fn parse_lines(text: &str) -> (Vec<Line>, Vec<LoadError>) {
    let mut errors = Vec::new();
    let mut frames = vec![Frame {
        indent: 0,
        lines: Vec::new(),
    }];
    // Deeper lines following a rejected line are dropped with it.
    let mut dropping_above: Option<usize> = None;

    for (index, raw) in text.lines().enumerate() {
        let number = index + 1;
        let content = strip_comment(raw);
        let content = content.trim_end();
        let body = content.trim_start();
        if body.is_empty() {
            continue;
        }
        let indent = indentation(content);

        if let Some(limit) = dropping_above {
            if indent > limit {
                continue;
            }
            dropping_above = None;
        }

        while frames.len() > 1 && indent < frames[frames.len() - 1].indent {
            close_frame(&mut frames);
        }

        let top = frames.len() - 1;
        if indent > frames[top].indent {
            let opens = frames[top].lines.last().is_some_and(|l| l.section && l.children.is_empty());
            if opens {
                frames.push(Frame {
                    indent,
                    lines: Vec::new(),
                });
            } else {
                errors.push(LoadError {
                    line: number,
                    message: "unexpected indentation".to_string(),
                });
                dropping_above = Some(frames[top].indent);
                continue;
            }
        }

        let top = frames.len() - 1;
        frames[top].lines.push(Line::new(body, number));
    }

    while frames.len() > 1 {
        close_frame(&mut frames);
    }
    let lines = frames.pop().map(|f| f.lines).unwrap_or_default();
    (lines, errors)
}

/// Pops the innermost frame and attaches its lines to the header above.
fn close_frame(frames: &mut Vec<Frame>) {
    if let Some(frame) = frames.pop() {
        if let Some(header) = frames.last_mut().and_then(|f| f.lines.last_mut()) {
            header.children = frame.lines;
        }
    }
}

fn indentation(line: &str) -> usize {
    line.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Removes a trailing comment. `#` inside a quoted string or `{...}` is
/// kept, and `##` is replaced with a single `#`.
fn strip_comment(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut quoted = false;
    let mut braces = 0usize;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => quoted = !quoted,
            '{' if !quoted => braces += 1,
            '}' if !quoted => braces = braces.saturating_sub(1),
            '#' if !quoted && braces == 0 => {
                if chars.peek() == Some(&'#') {
                    chars.next();
                } else {
                    break;
                }
            }
            _ => {}
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Scripts
// =============================================================================

/// The result of loading one script.
#[derive(Debug)]
pub struct Script {
    source: Arc<str>,
    triggers: Vec<Arc<Trigger>>,
    errors: Vec<LoadError>,
    warnings: Vec<LoadWarning>,
}

impl Script {
    /// Name the script was loaded under.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The triggers, in source order.
    #[must_use]
    pub fn triggers(&self) -> &[Arc<Trigger>] {
        &self.triggers
    }

    /// Lines that failed to load.
    #[must_use]
    pub fn errors(&self) -> &[LoadError] {
        &self.errors
    }

    /// Non-fatal remarks.
    #[must_use]
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// True if every line loaded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Loads scripts against one parser.
pub struct ScriptLoader {
    parser: SyntaxParser,
    controls: ControlSyntaxes,
}

impl ScriptLoader {
    /// Creates a loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the control statements cannot be compiled against
    /// the parser's type system.
    pub fn new(parser: SyntaxParser) -> Result<Self, RegistryError> {
        let controls = ControlSyntaxes::new(parser.registry().types())?;
        Ok(Self { parser, controls })
    }

    /// The parser scripts are loaded with.
    #[must_use]
    pub fn parser(&self) -> &SyntaxParser {
        &self.parser
    }

    /// Loads `text` under the name `source`.
    pub fn load(&self, source: &str, text: &str) -> Script {
        let source: Arc<str> = Arc::from(source);
        let (lines, mut errors) = parse_lines(text);
        let mut warnings = Vec::new();
        let mut triggers = Vec::new();

        for line in &lines {
            match self.trigger(line, &source) {
                Ok(built) => {
                    errors.extend(built.errors);
                    warnings.extend(built.warnings);
                    triggers.push(Arc::new(built.trigger));
                }
                Err(e) => errors.push(e),
            }
        }

        errors.sort_by_key(|e| e.line);
        warnings.sort_by_key(|w| w.line);
        for e in &errors {
            warn!(source = %source, line = e.line, error = %e.message, "script error");
        }
        debug!(
            source = %source,
            triggers = triggers.len(),
            errors = errors.len(),
            warnings = warnings.len(),
            "script loaded"
        );
        Script {
            source,
            triggers,
            errors,
            warnings,
        }
    }

    fn trigger(&self, line: &Line, source: &Arc<str>) -> Result<Built, LoadError> {
        let error = |message: String| LoadError {
            line: line.number,
            message,
        };
        if !line.section {
            return Err(error(format!(
                "'{}' is not a trigger; a script's top level may only contain 'on <event>:' sections",
                line.text
            )));
        }
        let event = strip_on(&line.text)
            .ok_or_else(|| error(format!("Can't understand this trigger: '{}'", line.text)))?;
        let parsed = self
            .parser
            .parse_event(event)
            .map_err(|d| error(d.message))?;
        let name = parsed.element.name.clone();
        let mut built = TriggerBuilder::new(&self.parser, &self.controls, &name).build(
            line,
            parsed.element,
            Arc::clone(source),
        );
        built.warnings.extend(parsed.warnings.into_iter().map(|w| LoadWarning {
            line: line.number,
            message: w.message,
        }));
        if line.children.is_empty() {
            built.warnings.push(LoadWarning {
                line: line.number,
                message: format!("'{}' has no statements", line.text),
            });
        }
        Ok(built)
    }
}

impl fmt::Debug for ScriptLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptLoader")
            .field("controls", &self.controls)
            .finish_non_exhaustive()
    }
}

/// Strips a leading `on` keyword.
fn strip_on(header: &str) -> Option<&str> {
    let (keyword, rest) = header.split_once(char::is_whitespace)?;
    keyword.eq_ignore_ascii_case("on").then(|| rest.trim())
}
