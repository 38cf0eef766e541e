//! Builder-pattern printer for rendering diagnostics.

use std::fmt::Write;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use rowan::TextRange;

use super::Diagnostics;
use super::message::{Diagnostic, RelatedInfo, Severity};

/// Renders diagnostics against shader source, or as plain lines without it.
pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: Vec<&'d Diagnostic>,
    source: Option<&'s str>,
    path: Option<&'s str>,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics: diagnostics.iter().collect(),
            source: None,
            path: None,
            colored: false,
        }
    }

    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn path(mut self, path: &'s str) -> Self {
        self.path = Some(path);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let Some(source) = self.source else {
            return self.format_plain(w);
        };

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            let notes = elsewhere_notes(diag, source.len());
            write!(w, "{}", renderer.render(&self.report(diag, source, &notes)))?;
        }

        Ok(())
    }

    /// Title group with the snippet, then one help group per hint.
    ///
    /// Related declarations that sit in this source become context
    /// annotations; those from other mixins (outside the rendered text)
    /// become notes on the title group.
    fn report<'a>(
        &self,
        diag: &'a Diagnostic,
        source: &'a str,
        notes: &'a [String],
    ) -> Vec<Group<'a>>
    where
        's: 'a,
    {
        let range = adjust_range(diag.range, source.len());
        let mut snippet = Snippet::source(source)
            .line_start(1)
            .annotation(AnnotationKind::Primary.span(range).label(&diag.message));

        if let Some(p) = self.path {
            snippet = snippet.path(p);
        }

        for related in diag.related.iter().filter(|r| in_source(r, source.len())) {
            snippet = snippet.annotation(
                AnnotationKind::Context
                    .span(adjust_range(related.range, source.len()))
                    .label(&related.message),
            );
        }

        let level = severity_to_level(diag.severity());
        let mut title = level.primary_title(&diag.message).element(snippet);
        for note in notes {
            title = title.element(Level::NOTE.message(note.as_str()));
        }

        let mut report = vec![title];
        for hint in &diag.hints {
            report.push(Group::with_title(Level::HELP.secondary_title(hint)));
        }
        report
    }

    fn format_plain(&self, w: &mut impl Write) -> std::fmt::Result {
        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{}", diag)?;
        }
        Ok(())
    }
}

/// A related span is drawn in the snippet only when it lies inside the
/// rendered source and is not the empty placeholder range.
fn in_source(related: &RelatedInfo, limit: usize) -> bool {
    !related.range.is_empty() && usize::from(related.range.end()) <= limit
}

fn elsewhere_notes(diag: &Diagnostic, limit: usize) -> Vec<String> {
    diag.related
        .iter()
        .filter(|r| !in_source(r, limit))
        .map(|r| {
            format!(
                "{} at {}..{}",
                r.message,
                u32::from(r.range.start()),
                u32::from(r.range.end())
            )
        })
        .collect()
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

fn adjust_range(range: TextRange, limit: usize) -> std::ops::Range<usize> {
    let start: usize = range.start().into();
    let end: usize = range.end().into();

    if start == end {
        return start..(start + 1).min(limit);
    }

    start..end
}

impl Diagnostics {
    pub fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}
