use colored::*;
use thermolang_eval::{EvalError, RuleFault, RuntimeError};
use thermolang_syntax::error::{LexError, Span, SyntaxError};

/// An error with its location in a script and hints for fixing it.
pub struct EnhancedError {
    pub message: String,
    pub span: Option<Span>,
    pub file: Option<String>,
    pub source: Option<String>,
    pub suggestion: Option<String>,
    pub help: Option<String>,
}

impl EnhancedError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            span: None,
            file: None,
            source: None,
            suggestion: None,
            help: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Prints the error to stderr with the offending source line underlined.
    pub fn display(&self) {
        self.display_as("error:".red().bold());
    }

    /// Like [`display`](Self::display) but labelled as a warning.
    pub fn display_warning(&self) {
        self.display_as("warning:".yellow().bold());
    }

    fn display_as(&self, label: ColoredString) {
        eprintln!("{} {}", label, self.message.bold());

        if let (Some(file), Some(span)) = (&self.file, &self.span) {
            eprintln!("  {} {}:{}:{}", "-->".blue().bold(), file, span.line, span.col);
        }

        if let (Some(source), Some(span)) = (&self.source, &self.span) {
            eprintln!();
            display_source_with_span(source, span);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!();
            eprintln!("{} {}", "suggestion:".green().bold(), suggestion);
        }

        if let Some(help) = &self.help {
            eprintln!();
            eprintln!("{} {}", "help:".cyan().bold(), help);
        }
    }
}

fn display_source_with_span(source: &str, span: &Span) {
    let lines: Vec<&str> = source.lines().collect();
    let line_idx = span.line.saturating_sub(1);
    if line_idx >= lines.len() {
        return;
    }

    let width = (line_idx + 3).min(lines.len()).to_string().len();

    // Two lines of context on either side.
    let start = line_idx.saturating_sub(2);
    let end = (line_idx + 3).min(lines.len());

    for (i, line) in lines.iter().enumerate().take(end).skip(start) {
        let line_num = i + 1;
        if line_num == span.line {
            eprintln!(
                "{:>width$} {} {}",
                line_num.to_string().blue().bold(),
                "|".blue().bold(),
                line,
                width = width
            );
            let spaces = " ".repeat(span.col.saturating_sub(1));
            let carets = "^".repeat(caret_width(line, span));
            eprintln!(
                "{:>width$} {} {}{}",
                "",
                "|".blue().bold(),
                spaces,
                carets.red().bold(),
                width = width
            );
        } else {
            eprintln!(
                "{:>width$} {} {}",
                line_num.to_string().dimmed(),
                "|".blue().bold(),
                line,
                width = width
            );
        }
    }
}

/// Underline width for `span` on its first line. Multi-line spans stop at
/// the end of that line.
fn caret_width(line: &str, span: &Span) -> usize {
    let remaining = line.chars().count().saturating_sub(span.col.saturating_sub(1));
    span.end.saturating_sub(span.start).min(remaining).max(1)
}

/// Whether a parser expectation lists enumerated constants.
fn names_constants(expected: &str) -> bool {
    expected.starts_with("one of ") || expected == "ON or OFF"
}

/// Builds a report for a script that failed to lex or parse.
pub fn syntax_error(error: &SyntaxError, file: &str, source: &str) -> EnhancedError {
    let enhanced = EnhancedError::new(format!("Syntax error: {}", error))
        .with_span(error.span())
        .with_file(file)
        .with_source(source);

    match error {
        SyntaxError::Lex(LexError::UnterminatedString { .. }) => {
            enhanced.with_suggestion("Close the string with a matching '\"'")
        }
        SyntaxError::Lex(_) => enhanced.with_help("Check for invalid characters or stray symbols"),
        SyntaxError::UnexpectedEof { .. } => enhanced
            .with_suggestion("Check that every '{' has a matching '}'")
            .with_help("Rules take the form: RULE <condition> { ... }"),
        SyntaxError::UnexpectedToken { expected, .. } if expected.contains("SECONDS") => {
            enhanced.with_suggestion("WAIT needs a unit: WAIT 10 SECONDS")
        }
        SyntaxError::UnexpectedToken { expected, .. } if names_constants(expected) => enhanced
            .with_help(
                "MODE takes COOL/HEAT/DRY/FAN/AUTO, FAN takes OFF/LOW/MID/HIGH/AUTO, POWER takes ON/OFF",
            ),
        _ => enhanced,
    }
}

/// Builds a warning for a rule aborted at runtime.
pub fn rule_fault(fault: &RuleFault, file: &str, source: &str) -> EnhancedError {
    let enhanced = EnhancedError::new(format!("rule {} aborted in pass {}: {}", fault.rule, fault.pass, fault.error))
        .with_span(fault.error.span())
        .with_file(file)
        .with_source(source);

    match &fault.error {
        RuntimeError::Eval(EvalError::UndefinedVariable { name, .. }) => enhanced
            .with_suggestion(format!("Assign '{}' with SET {} = ... before reading it", name, name)),
        RuntimeError::Eval(EvalError::DivisionByZero { .. }) => {
            enhanced.with_suggestion("Guard the division with an IF on the divisor")
        }
        RuntimeError::Eval(EvalError::TypeMismatch { .. }) => {
            enhanced.with_help("Conditions and arithmetic need integers; strings only compare with strings")
        }
        RuntimeError::StepLimit { .. } => enhanced
            .with_suggestion("Add a WAIT inside the loop or make sure its condition becomes false"),
        RuntimeError::Device { .. } => enhanced.with_help("The simulated unit accepts setpoints from 0 to 50"),
        _ => enhanced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thermolang::parse_source;

    fn report(source: &str) -> EnhancedError {
        let err = parse_source(source).unwrap_err();
        syntax_error(&err, "test.thermo", source)
    }

    #[test]
    fn test_constant_help_only_for_bad_constants() {
        assert!(report("SET MODE = WARM").help.is_some_and(|h| h.contains("MODE takes")));
        assert!(report("SET POWER = 1").help.is_some());
        assert!(report("SET TEMP = * 2").help.is_none());
        assert!(report("SET FAN = LOW )").help.is_none());
    }

    #[test]
    fn test_wait_without_unit_suggests_seconds() {
        let enhanced = report("WAIT 5 SET FAN = LOW");
        assert!(enhanced.suggestion.is_some_and(|s| s.contains("SECONDS")));
    }

    #[test]
    fn test_caret_width_stops_at_end_of_line() {
        let source = "WHILE 1 {\n    SET FAN = LOW\n}";
        let span = Span { line: 1, col: 1, start: 0, end: source.len() };
        assert_eq!(caret_width("WHILE 1 {", &span), 9);

        let inner = Span { line: 2, col: 5, start: 14, end: 27 };
        assert_eq!(caret_width("    SET FAN = LOW", &inner), 13);

        let past_end = Span { line: 1, col: 20, start: 19, end: 19 };
        assert_eq!(caret_width("SET", &past_end), 1);
    }
}
