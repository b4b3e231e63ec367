// diag.rs — Unified diagnostics model
//
// Shared diagnostic types used across all analysis phases. Analysis findings
// (rank mismatches, divergences) and user-facing errors (malformed pragmas)
// travel through the same type; stable codes let hosts filter.
//
// Preconditions: none (types only).
// Postconditions: none (types only).
// Failure modes: none.
// Side effects: none.

use std::fmt;

use serde::Serialize;

// ── Diagnostic code ──────────────────────────────────────────────────────

/// A stable diagnostic code (e.g., `E0301`, `W0302`).
///
/// Codes are `&'static str` constants defined in the `codes` module.
/// Once assigned, a code must never be reassigned to a different semantic
/// meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DiagCode(pub &'static str);

impl fmt::Display for DiagCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable codes for every diagnostic the checker emits.
pub mod codes {
    use super::DiagCode;

    /// Instrumentation pragma: expected a function name.
    pub const E0101: DiagCode = DiagCode("E0101");
    /// Instrumentation pragma: missing closing parenthesis.
    pub const E0102: DiagCode = DiagCode("E0102");
    /// Instrumentation pragma: unexpected closing parenthesis.
    pub const E0103: DiagCode = DiagCode("E0103");
    /// Unknown pragma directive (ignored).
    pub const W0104: DiagCode = DiagCode("W0104");

    /// CFG invariant violation: edge references an unknown block.
    pub const E0201: DiagCode = DiagCode("E0201");
    /// Block unreachable from entry; excluded from the analysis.
    pub const W0202: DiagCode = DiagCode("W0202");
    /// Rank propagation exceeded its iteration bound.
    pub const E0203: DiagCode = DiagCode("E0203");
    /// Duplicate block label in a function declaration.
    pub const E0204: DiagCode = DiagCode("E0204");
    /// Function declares no blocks.
    pub const E0205: DiagCode = DiagCode("E0205");

    /// Conflicting collective operations within one rank.
    pub const E0301: DiagCode = DiagCode("E0301");
    /// Collective on one path with no counterpart on a converging path.
    pub const W0302: DiagCode = DiagCode("W0302");
}

// ── Severity level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagLevel {
    Error,
    Warning,
}

// ── Diagnostic ───────────────────────────────────────────────────────────

/// A diagnostic emitted by any phase.
///
/// CFG statements carry no source spans, so location context is the
/// enclosing function's name (when known) plus whatever block/rank detail
/// the message itself spells out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub code: Option<DiagCode>,
    pub level: DiagLevel,
    pub function: Option<String>,
    pub message: String,
    pub hint: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with no code, function context, or hint.
    pub fn new(level: DiagLevel, message: impl Into<String>) -> Self {
        Self {
            code: None,
            level,
            function: None,
            message: message.into(),
            hint: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(DiagLevel::Warning, message)
    }

    /// Attach a stable diagnostic code.
    pub fn with_code(mut self, code: DiagCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach the enclosing function's name.
    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.level {
            DiagLevel::Error => "error",
            DiagLevel::Warning => "warning",
        };
        match &self.code {
            Some(code) => write!(f, "{}[{}]: ", level, code)?,
            None => write!(f, "{}: ", level)?,
        }
        if let Some(fun) = &self.function {
            write!(f, "in '{}': ", fun)?;
        }
        write!(f, "{}", self.message)?;
        if let Some(hint) = &self.hint {
            write!(f, "\n  hint: {}", hint)?;
        }
        Ok(())
    }
}
