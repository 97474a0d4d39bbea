use crate::frontmatter::FrontmatterError;
use thiserror::Error;

/// Source location information for error reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Optional file path
    pub file: Option<String>,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

impl SourceLocation {
    /// Create a new source location
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            file: None,
            line,
            column,
        }
    }

    /// Attach a file path to this location.
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        let file = file.into();
        if !file.is_empty() {
            self.file = Some(file);
        }
        self
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}:{}:{}", file, self.line, self.column)
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

/// Failure raised by a single tree or AST pass.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PassError {
    message: String,
}

impl PassError {
    /// Create a pass error with a human readable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message the pass reported.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Fatal errors for a single document compile. No partial tree survives one.
#[derive(Debug, Error)]
pub enum CompilationError {
    /// markdown-rs rejected the source.
    #[error("Parse error at {location}: {message}")]
    Parse {
        /// Error message
        message: String,
        /// Source location
        location: SourceLocation,
    },
    /// The leading metadata block could not be turned into a mapping.
    #[error("Frontmatter error in {path}")]
    Frontmatter {
        /// Document path
        path: String,
        /// Underlying frontmatter failure
        #[source]
        source: FrontmatterError,
    },
    /// A built-in or caller-supplied pass failed.
    #[error("Pass `{pass}` failed for {path}")]
    Pass {
        /// Name of the failing pass
        pass: String,
        /// Document path
        path: String,
        /// Underlying pass failure
        #[source]
        source: PassError,
    },
    /// Bundler-facing wrapper naming the file that could not be processed.
    #[error("Failed to process MDX for {filename}")]
    Transform {
        /// File handed over by the bundler
        filename: String,
        /// Original compile failure
        #[source]
        source: Box<CompilationError>,
    },
    /// Failure of the one-shot remote compile entrypoint.
    #[error("Failed to compile remote MDX: {source}")]
    Remote {
        /// Original compile failure
        #[source]
        source: Box<CompilationError>,
    },
}

impl CompilationError {
    /// Create a parse error with location
    pub fn parse_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::Parse {
            message: message.into(),
            location,
        }
    }

    /// Walks the `source` chain down to the innermost cause.
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        let mut current: &(dyn std::error::Error + 'static) = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current
    }
}

/// Error severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that was recovered from
    Error,
    /// Warning that doesn't prevent rendering
    Warning,
}

/// A recovered, non-fatal condition reported next to a successful result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Message shown to the author
    pub message: String,
    /// Diagnostic severity
    pub severity: ErrorSeverity,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            ErrorSeverity::Error => "error",
            ErrorSeverity::Warning => "warning",
        };
        write!(f, "{}: {}", severity, self.message)
    }
}

/// Ordered collection of diagnostics gathered by one lowering or render pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create a new empty diagnostics collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a warning
    pub fn warn(&mut self, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            message: message.into(),
            severity: ErrorSeverity::Warning,
        });
    }

    /// Add a recovered error
    pub fn error(&mut self, message: impl Into<String>) {
        self.entries.push(Diagnostic {
            message: message.into(),
            severity: ErrorSeverity::Error,
        });
    }

    /// Iterate over the collected diagnostics in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Number of collected diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no diagnostics
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Moves every diagnostic of `other` into this collection.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_display_includes_file_when_present() {
        let loc = SourceLocation::new(3, 7).in_file("docs/intro.mdx");
        assert_eq!(loc.to_string(), "docs/intro.mdx:3:7");
        assert_eq!(SourceLocation::new(1, 1).in_file("").to_string(), "1:1");
    }

    #[test]
    fn transform_error_keeps_cause_chain() {
        let inner = CompilationError::Pass {
            pass: "custom".to_string(),
            path: "a.mdx".to_string(),
            source: PassError::new("boom"),
        };
        let outer = CompilationError::Transform {
            filename: "a.mdx".to_string(),
            source: Box::new(inner),
        };
        assert_eq!(outer.to_string(), "Failed to process MDX for a.mdx");
        assert_eq!(outer.root_cause().to_string(), "boom");
    }

    #[test]
    fn diagnostics_collect_in_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn("first");
        diagnostics.error("second");
        let rendered: Vec<String> = diagnostics.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["warning: first", "error: second"]);
        assert_eq!(diagnostics.len(), 2);
    }
}
