//! Fenced code block scanning
//!
//! Recognizes blocks opened by a line of three or more backticks (or tildes),
//! optionally followed by a language tag, and closed by a line holding only
//! the same fence character repeated at least as many times. Anything else is
//! plain text. Malformed input never fails: an unclosed fence is simply not
//! reported.

use std::ops::Range;

/// A fenced block as it appears in the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlock {
    pub language_tag: Option<String>,
    /// Body with surrounding blank lines and common indentation removed
    pub body: String,
    /// Byte range from the opening fence to the end of the closing fence line
    pub span: Range<usize>,
}

/// Scan a complete text. End of input terminates the last line.
pub fn scan(text: &str) -> Vec<RawBlock> {
    let mut scanner = StreamingScanner::new();
    let mut blocks = scanner.push(text);
    blocks.extend(scanner.finish());
    blocks
}

#[derive(Debug, Clone)]
struct OpenFence {
    start: usize,
    body_start: usize,
    marker: char,
    width: usize,
    language_tag: Option<String>,
}

/// Incremental scanner over an append-only buffer
///
/// Only complete lines are examined by [`push`](Self::push); the scanner
/// remembers the offset of the first unexamined line, how much of that line
/// has already been searched for a newline, and the currently open fence, so
/// each call costs time proportional to the newly appended text.
/// A block is returned exactly once, when its closing fence line completes.
#[derive(Debug, Default)]
pub struct StreamingScanner {
    buffer: String,
    scanned: usize,
    /// Bytes of the unfinished line already known to hold no newline
    searched: usize,
    open: Option<OpenFence>,
}

impl StreamingScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return the blocks closed by it
    pub fn push(&mut self, text: &str) -> Vec<RawBlock> {
        self.buffer.push_str(text);
        self.advance(false)
    }

    /// Treat the end of the buffer as the end of the last line
    ///
    /// Returns a block whose closing fence is the unterminated last line.
    /// A fence still open at this point is dropped.
    pub fn finish(&mut self) -> Vec<RawBlock> {
        let blocks = self.advance(true);
        self.open = None;
        blocks
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn into_buffer(self) -> String {
        self.buffer
    }

    /// Offset of the first byte not yet examined
    pub fn scanned_offset(&self) -> usize {
        self.scanned
    }

    pub fn has_open_fence(&self) -> bool {
        self.open.is_some()
    }

    fn advance(&mut self, at_eof: bool) -> Vec<RawBlock> {
        let mut blocks = Vec::new();

        while self.scanned < self.buffer.len() {
            let line_start = self.scanned;
            let search_start = self.searched.max(line_start);
            let (raw_line, next) = match self.buffer[search_start..].find('\n') {
                Some(offset) => {
                    let newline = search_start + offset;
                    (&self.buffer[line_start..newline], newline + 1)
                },
                None if at_eof => (&self.buffer[line_start..], self.buffer.len()),
                None => {
                    self.searched = self.buffer.len();
                    break;
                },
            };
            let line_end = line_start + raw_line.len();
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);

            self.open = match self.open.take() {
                None => parse_opening(line).map(|(marker, width, language_tag)| OpenFence {
                    start: line_start,
                    body_start: next,
                    marker,
                    width,
                    language_tag,
                }),
                Some(open) if is_closing(line, open.marker, open.width) => {
                    let body = normalize_body(&self.buffer[open.body_start..line_start]);
                    if !body.is_empty() {
                        blocks.push(RawBlock {
                            language_tag: open.language_tag,
                            body,
                            span: open.start..line_end,
                        });
                    }
                    None
                },
                Some(open) => Some(open),
            };

            self.scanned = next;
        }

        blocks
    }
}

fn parse_opening(line: &str) -> Option<(char, usize, Option<String>)> {
    let trimmed = line.trim_start();
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let width = trimmed.chars().take_while(|c| *c == marker).count();
    if width < 3 {
        return None;
    }

    let info = &trimmed[width..];
    // Backticks in the info string mean inline code, not a fence
    if marker == '`' && info.contains('`') {
        return None;
    }

    let language_tag = info
        .split_whitespace()
        .next()
        .map(|tag| tag.trim_matches(|c: char| c == '{' || c == '}' || c == '.'))
        .filter(|tag| !tag.is_empty())
        .map(str::to_string);

    Some((marker, width, language_tag))
}

fn is_closing(line: &str, marker: char, width: usize) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= width && trimmed.chars().all(|c| c == marker)
}

/// Strip surrounding blank lines and the indentation shared by all
/// non-blank lines
pub fn normalize_body(body: &str) -> String {
    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let first = lines.iter().position(|line| !line.trim().is_empty());
    let last = lines.iter().rposition(|line| !line.trim().is_empty());
    let (Some(first), Some(last)) = (first, last) else {
        return String::new();
    };
    let lines = &lines[first..=last];

    let indent = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| leading_whitespace(line))
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            let strip = indent.min(leading_whitespace(line));
            let offset = line
                .char_indices()
                .nth(strip)
                .map(|(i, _)| i)
                .unwrap_or(line.len());
            &line[offset..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}
