use console::style;

/// Receives user-facing notices, e.g. which decorators were inserted into a solver chain.
pub trait Diagnostics {
    fn message(&mut self, text: &str);

    fn warning(&mut self, text: &str);
}

/// Prints messages to stdout and warnings to stderr.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleDiagnostics;

impl Diagnostics for ConsoleDiagnostics {
    fn message(&mut self, text: &str) {
        println!("{} {}", style("note:").bold().dim(), text);
    }

    fn warning(&mut self, text: &str) {
        eprintln!("{} {}", style("warning:").bold().yellow(), text);
    }
}

/// Keeps all notices, useful for tests.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordingDiagnostics {
    pub messages: Vec<String>,
    pub warnings: Vec<String>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn message(&mut self, text: &str) {
        log::info!("{}", text);
        self.messages.push(text.to_owned());
    }

    fn warning(&mut self, text: &str) {
        log::warn!("{}", text);
        self.warnings.push(text.to_owned());
    }
}
