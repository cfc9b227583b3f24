use tower_lsp::jsonrpc::Result as LspResult;
use tower_lsp::lsp_types::*;

use crate::error::EngineError;
use crate::lint::{LintFinding, Severity};
use crate::lsp::backend::Backend;
use crate::lsp::document::DocumentState;
use crate::parser::{self, describe_code, Command, SUPPORTED_CODES};

const DIAGNOSTIC_SOURCE: &str = "gcode-analyzer";

/// Trait for handling hover requests
#[tower_lsp::async_trait]
pub trait HandleHover {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>>;
}

/// Trait for handling completion requests
#[tower_lsp::async_trait]
pub trait HandleCompletion {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>>;
}

/// Trait for handling document symbols
#[tower_lsp::async_trait]
pub trait HandleDocumentSymbol {
    async fn handle_document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> LspResult<Option<DocumentSymbolResponse>>;
}

/// Trait for handling diagnostics
#[tower_lsp::async_trait]
pub trait HandleDiagnostics {
    async fn create_document_state(&self, content: String) -> DocumentState;
    async fn publish_diagnostics(&self, uri: Url);
}

#[tower_lsp::async_trait]
impl HandleHover for Backend {
    async fn handle_hover(&self, params: HoverParams) -> LspResult<Option<Hover>> {
        let tdpp = params.text_document_position_params;
        let uri = tdpp.text_document.uri;
        let pos = tdpp.position;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let line = doc_state.content.lines().nth(pos.line as usize).unwrap_or("");
        let hover = word_at(line, char_index(line, pos.character))
            .and_then(|word| hover_markdown(&word))
            .map(|value| Hover {
                contents: HoverContents::Markup(MarkupContent {
                    kind: MarkupKind::Markdown,
                    value,
                }),
                range: None,
            });

        Ok(hover)
    }
}

#[tower_lsp::async_trait]
impl HandleCompletion for Backend {
    async fn handle_completion(
        &self,
        params: CompletionParams,
    ) -> LspResult<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;
        let pos = params.text_document_position.position;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        let line = doc_state.content.lines().nth(pos.line as usize).unwrap_or("");
        let completions = completion_items(&prefix_at(line, char_index(line, pos.character)));

        if completions.is_empty() {
            Ok(None)
        } else {
            Ok(Some(CompletionResponse::Array(completions)))
        }
    }
}

#[tower_lsp::async_trait]
impl HandleDiagnostics for Backend {
    /// Analyze new content against its machine
    async fn create_document_state(&self, content: String) -> DocumentState {
        let registry = self.registry.lock().await;
        DocumentState::analyze(content, &self.config, &registry)
    }

    /// Publish diagnostics for a document
    async fn publish_diagnostics(&self, uri: Url) {
        let docs = self.documents.lock().await;
        let diagnostics = match docs.get(&uri) {
            Some(state) => document_diagnostics(state),
            None => return,
        };
        drop(docs);

        self.client
            .publish_diagnostics(uri, diagnostics, None)
            .await;
    }
}

#[tower_lsp::async_trait]
impl HandleDocumentSymbol for Backend {
    async fn handle_document_symbol(
        &self,
        params: DocumentSymbolParams,
    ) -> LspResult<Option<DocumentSymbolResponse>> {
        let uri = params.text_document.uri;

        let docs = self.documents.lock().await;
        let doc_state = match docs.get(&uri) {
            Some(state) => state,
            None => return Ok(None),
        };

        Ok(Some(DocumentSymbolResponse::Nested(document_symbols(
            &doc_state.content,
        ))))
    }
}

/// Convert an LSP position column (UTF-16 code units) to a char index.
/// Columns past the end of the line clamp to its length.
pub fn char_index(line: &str, utf16_column: u32) -> usize {
    let mut units = 0;
    for (index, c) in line.chars().enumerate() {
        if units >= utf16_column as usize {
            return index;
        }
        units += c.len_utf16();
    }
    line.chars().count()
}

/// The G/M word under or right before the cursor (`character` in chars)
pub fn word_at(line: &str, character: usize) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut start = 0;

    while start < chars.len() {
        if !chars[start].is_ascii_alphabetic() {
            start += 1;
            continue;
        }
        let end = chars[start + 1..]
            .iter()
            .position(|c| !(c.is_ascii_digit() || *c == '.'))
            .map_or(chars.len(), |n| start + 1 + n);

        if end > start + 1 && (start..=end).contains(&character) {
            return Some(chars[start..end].iter().collect());
        }
        start = end;
    }

    None
}

/// The partial word being typed before the cursor, upper-cased
pub fn prefix_at(line: &str, character: usize) -> String {
    let before: Vec<char> = line.chars().take(character).collect();
    let start = before
        .iter()
        .rposition(|c| !(c.is_ascii_alphanumeric() || *c == '.'))
        .map_or(0, |n| n + 1);
    before[start..].iter().collect::<String>().to_ascii_uppercase()
}

pub fn hover_markdown(word: &str) -> Option<String> {
    let canonical = parser::classify::canonical_code(word)?;
    let description = describe_code(&canonical)?;
    Some(format!("**{}**\n\n{}", canonical, description))
}

pub fn completion_items(prefix: &str) -> Vec<CompletionItem> {
    SUPPORTED_CODES
        .iter()
        .filter(|(code, _)| code.starts_with(prefix))
        .map(|(code, description)| CompletionItem {
            label: code.to_string(),
            kind: Some(CompletionItemKind::KEYWORD),
            detail: Some(description.to_string()),
            sort_text: Some(sort_key(code)),
            ..Default::default()
        })
        .collect()
}

/// Numeric order within each letter: G0, G1, G20, ..
fn sort_key(code: &str) -> String {
    let (letter, number) = code.split_at(1);
    format!("{}{:0>4}", letter, number)
}

/// LSP diagnostics for a document's analysis
pub fn document_diagnostics(state: &DocumentState) -> Vec<Diagnostic> {
    match &state.analysis {
        Ok(result) => result
            .lints
            .iter()
            .map(|finding| finding_diagnostic(finding, &state.content))
            .collect(),
        Err(err @ EngineError::Encoding { line, .. }) => vec![Diagnostic {
            range: line_range(&state.content, line.saturating_sub(1)),
            severity: Some(DiagnosticSeverity::ERROR),
            source: Some(DIAGNOSTIC_SOURCE.to_string()),
            message: err.to_string(),
            ..Default::default()
        }],
        // Nothing to report for a document without commands yet
        Err(EngineError::EmptyProgram) => Vec::new(),
    }
}

/// Convert a finding; whole-program findings go on the first line
pub fn finding_diagnostic(finding: &LintFinding, content: &str) -> Diagnostic {
    let severity = match finding.severity {
        Severity::Error => DiagnosticSeverity::ERROR,
        Severity::Warning => DiagnosticSeverity::WARNING,
        Severity::Info => DiagnosticSeverity::INFORMATION,
    };
    let line = finding.source_line.map_or(0, |n| n.saturating_sub(1));

    Diagnostic {
        range: line_range(content, line),
        severity: Some(severity),
        code: Some(NumberOrString::String(finding.rule_id.clone())),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: finding.message.clone(),
        ..Default::default()
    }
}

fn line_range(content: &str, line: u32) -> Range {
    let len = content
        .lines()
        .nth(line as usize)
        .map_or(0, |text| text.encode_utf16().count());
    Range::new(Position::new(line, 0), Position::new(line, len as u32))
}

/// One symbol per line that changes modal state (units, WCS, spindle, ...)
pub fn document_symbols(content: &str) -> Vec<DocumentSymbol> {
    parser::parse_program(content)
        .into_iter()
        .filter_map(|line| {
            let changes: Vec<&Command> = line
                .commands
                .iter()
                .filter(|command| command.is_state_change())
                .collect();
            let first = changes.first()?;

            let detail = changes
                .iter()
                .filter_map(|command| describe_command(command))
                .collect::<Vec<_>>()
                .join("; ");
            let range = line_range(content, line.number() - 1);

            Some(DocumentSymbol {
                name: line.source.code.clone(),
                detail: (!detail.is_empty()).then_some(detail),
                kind: symbol_kind(first),
                tags: None,
                #[allow(deprecated)]
                deprecated: Some(false), // Required by tower-lsp 0.20
                range,
                selection_range: range,
                children: None,
            })
        })
        .collect()
}

fn symbol_kind(command: &Command) -> SymbolKind {
    match command {
        Command::SpindleOn { .. } | Command::SpindleOff | Command::ProgramEnd => {
            SymbolKind::PROPERTY
        }
        Command::SetFeedRate { .. } | Command::SetSpindleSpeed { .. } => SymbolKind::VARIABLE,
        _ => SymbolKind::FUNCTION,
    }
}

fn describe_command(command: &Command) -> Option<String> {
    let code = match command {
        Command::SetUnits { metric } => if *metric { "G21" } else { "G20" }.to_string(),
        Command::SetPositioningMode { absolute } => {
            if *absolute { "G90" } else { "G91" }.to_string()
        }
        Command::SelectWcs { index } => format!("G{}", 53 + u32::from(*index)),
        Command::SpindleOn { cw } => if *cw { "M3" } else { "M4" }.to_string(),
        Command::SpindleOff => "M5".to_string(),
        Command::ProgramEnd => "M2".to_string(),
        Command::SetFeedRate { value } => return Some(format!("Feed rate {}", value)),
        Command::SetSpindleSpeed { rpm } => return Some(format!("Spindle speed {} rpm", rpm)),
        _ => return None,
    };
    describe_code(&code).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, AnalysisConfig};

    fn state(content: &str) -> DocumentState {
        DocumentState {
            content: content.to_string(),
            machine: None,
            analysis: analyze(content, &AnalysisConfig::default()),
        }
    }

    #[test]
    fn test_word_at() {
        assert_eq!(word_at("G1 X10 Y20", 0).as_deref(), Some("G1"));
        assert_eq!(word_at("G1 X10 Y20", 2).as_deref(), Some("G1"));
        assert_eq!(word_at("G1 X10 Y20", 4).as_deref(), Some("X10"));
        assert_eq!(word_at("G00X1", 1).as_deref(), Some("G00"));
        assert_eq!(word_at("(rapid)", 2), None);
        assert_eq!(word_at("", 0), None);
    }

    #[test]
    fn test_char_index_counts_utf16_units() {
        assert_eq!(char_index("G1 X10", 3), 3);
        // U+1F527 takes two UTF-16 units but is one char
        let line = "(\u{1F527}) G90";
        assert_eq!(char_index(line, 5), 4);
        assert_eq!(word_at(line, char_index(line, 5)).as_deref(), Some("G90"));
        assert_eq!(prefix_at(line, char_index(line, 7)), "G9");
        assert_eq!(char_index(line, 40), line.chars().count());
    }

    #[test]
    fn test_prefix_at() {
        assert_eq!(prefix_at("G2", 2), "G2");
        assert_eq!(prefix_at("G21 m", 5), "M");
        assert_eq!(prefix_at("G21 ", 4), "");
    }

    #[test]
    fn test_hover_markdown() {
        assert_eq!(
            hover_markdown("g00").as_deref(),
            Some("**G0**\n\nRapid positioning")
        );
        assert!(hover_markdown("X10").is_none());
        assert!(hover_markdown("G17").is_none());
    }

    #[test]
    fn test_completion_items() {
        let labels: Vec<_> = completion_items("G5")
            .into_iter()
            .map(|item| item.label)
            .collect();
        assert_eq!(labels, vec!["G54", "G55", "G56", "G57", "G58", "G59"]);

        assert_eq!(completion_items("").len(), SUPPORTED_CODES.len());
        assert!(completion_items("T").is_empty());
    }

    #[test]
    fn test_sort_key_orders_numerically() {
        assert!(sort_key("G1") < sort_key("G20"));
        assert!(sort_key("M5") < sort_key("M30"));
    }

    #[test]
    fn test_finding_diagnostics() {
        let diagnostics = document_diagnostics(&state("G1 X1\nM30\n"));

        assert!(!diagnostics.is_empty());
        // units-not-set has no line and lands on the first line
        let units = &diagnostics[0];
        assert_eq!(
            units.code,
            Some(NumberOrString::String("units-not-set".to_string()))
        );
        assert_eq!(units.range.start.line, 0);
        assert_eq!(units.source.as_deref(), Some("gcode-analyzer"));

        let feed = diagnostics
            .iter()
            .find(|d| d.code == Some(NumberOrString::String("cut-without-feed".to_string())))
            .unwrap();
        assert_eq!(feed.severity, Some(DiagnosticSeverity::ERROR));
        assert_eq!(feed.range.end.character, 5);
    }

    #[test]
    fn test_empty_document_has_no_diagnostics() {
        assert!(document_diagnostics(&state("(just a comment)\n")).is_empty());
    }

    #[test]
    fn test_document_symbols() {
        let symbols = document_symbols("%\nG21 G90\nG0 X1\nM3 S9000\nM30\n");

        let names: Vec<_> = symbols.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["G21 G90", "M3 S9000", "M30"]);
        assert_eq!(symbols[0].range.start.line, 1);
        assert_eq!(
            symbols[0].detail.as_deref(),
            Some("Units: millimetres; Absolute positioning")
        );
        assert_eq!(symbols[1].kind, SymbolKind::VARIABLE);
        assert_eq!(symbols[2].kind, SymbolKind::PROPERTY);
    }
}
