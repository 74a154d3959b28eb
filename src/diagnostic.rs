use std::collections::BTreeSet;
use std::fmt::{self, Write as _};

use owo_colors::OwoColorize;

/// A source span representing a range of bytes in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Move the span right by `offset` bytes.
    pub fn shift(self, offset: usize) -> Span {
        Span {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

/// A label pointing to a specific span in the source
#[derive(Debug, Clone)]
pub struct Label {
    pub span: Span,
    pub message: String,
}

impl Label {
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A complete diagnostic message
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub code: Option<String>,
    pub message: String,
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.notes.push(format!("help: {}", help.into()));
        self
    }
}

/// Computes line and column from a byte offset
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}

/// Byte offset at which the 1-based `line` starts.
pub fn line_start(source: &str, line: usize) -> usize {
    if line <= 1 {
        return 0;
    }
    source
        .match_indices('\n')
        .nth(line - 2)
        .map(|(i, _)| i + 1)
        .unwrap_or(source.len())
}

fn line_content(source: &str, line_num: usize) -> Option<&str> {
    source.lines().nth(line_num.checked_sub(1)?)
}

#[derive(Clone, Copy)]
enum Paint {
    Error,
    Emphasis,
    Gutter,
    Marker,
}

/// Renders diagnostics in the rustc layout: header, `-->` location, the
/// offending source lines with caret underlines, then notes.
pub struct DiagnosticRenderer<'a> {
    source: &'a str,
    file_name: &'a str,
    use_color: bool,
}

impl<'a> DiagnosticRenderer<'a> {
    pub fn new(source: &'a str, file_name: &'a str, use_color: bool) -> Self {
        Self {
            source,
            file_name,
            use_color,
        }
    }

    pub fn render(&self, diagnostic: &Diagnostic) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_diagnostic(&mut out, diagnostic);
        out
    }

    fn write_diagnostic(&self, out: &mut String, diagnostic: &Diagnostic) -> fmt::Result {
        let severity = match &diagnostic.code {
            Some(code) => format!("error[{}]", code),
            None => "error".to_string(),
        };
        writeln!(
            out,
            "{}: {}",
            self.paint(&severity, Paint::Error),
            self.paint(&diagnostic.message, Paint::Emphasis)
        )?;

        if let Some(first) = diagnostic.labels.first() {
            let (line, col) = line_col(self.source, first.span.start);
            writeln!(out, "  {} {}:{}:{}", self.paint("-->", Paint::Gutter), self.file_name, line, col)?;

            let shown: BTreeSet<usize> = diagnostic
                .labels
                .iter()
                .flat_map(|label| {
                    let (first_line, last_line) = self.label_lines(label);
                    first_line..=last_line
                })
                .collect();
            let width = shown.iter().next_back().map_or(1, |n| n.to_string().len());
            let pad = " ".repeat(width + 1);
            let bar = self.paint("|", Paint::Gutter);

            writeln!(out, "{} {}", pad, bar)?;
            for &line_num in &shown {
                let Some(content) = line_content(self.source, line_num) else {
                    continue;
                };
                writeln!(
                    out,
                    "{} {} {}",
                    self.paint(&format!("{:>w$}", line_num, w = width + 1), Paint::Gutter),
                    bar,
                    content
                )?;
                for label in &diagnostic.labels {
                    if let Some(underline) = self.underline(label, line_num, content) {
                        writeln!(out, "{} {} {}", pad, bar, self.paint(&underline, Paint::Marker))?;
                    }
                }
            }
            writeln!(out, "{} {}", pad, bar)?;
        }

        for note in &diagnostic.notes {
            writeln!(out, "  {} {}", self.paint("=", Paint::Gutter), note)?;
        }
        Ok(())
    }

    /// First and last source line a label touches.
    fn label_lines(&self, label: &Label) -> (usize, usize) {
        let (first, _) = line_col(self.source, label.span.start);
        let (last, _) = line_col(self.source, label.span.end.saturating_sub(1).max(label.span.start));
        (first, last)
    }

    /// Carets under the part of `content` (line `line_num`) the label covers.
    fn underline(&self, label: &Label, line_num: usize, content: &str) -> Option<String> {
        let (first, last) = self.label_lines(label);
        if line_num < first || line_num > last {
            return None;
        }

        let start_col = if line_num == first {
            line_col(self.source, label.span.start).1
        } else {
            1
        };
        let end_col = if line_num == last {
            line_col(self.source, label.span.end.saturating_sub(1).max(label.span.start)).1 + 1
        } else {
            content.chars().count() + 1
        };

        let mut underline = " ".repeat(start_col - 1);
        underline.push_str(&"^".repeat(end_col.saturating_sub(start_col).max(1)));
        if !label.message.is_empty() {
            underline.push(' ');
            underline.push_str(&label.message);
        }
        Some(underline)
    }

    fn paint(&self, text: &str, paint: Paint) -> String {
        if !self.use_color {
            return text.to_string();
        }
        match paint {
            Paint::Error => text.red().bold().to_string(),
            Paint::Emphasis => text.bold().to_string(),
            Paint::Gutter => text.blue().to_string(),
            Paint::Marker => text.red().to_string(),
        }
    }
}
