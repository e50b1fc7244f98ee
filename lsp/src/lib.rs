use std::collections::HashMap;

use async_trait::async_trait;
use deco::{LexError, ParseError, Token, TokenKind};
use parking_lot::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

#[derive(Debug)]
pub struct Backend {
    client: Client,
    client_capabilities: RwLock<ClientCapabilities>,
    documents: RwLock<HashMap<Url, String>>,
}

impl Backend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            client_capabilities: RwLock::new(ClientCapabilities::default()),
            documents: RwLock::new(HashMap::new()),
        }
    }

    fn has_publish_diagnostics(&self) -> bool {
        let lock = self.client_capabilities.read();
        if let Some(text_document) = &lock.text_document {
            text_document.publish_diagnostics.is_some()
        } else {
            false
        }
    }

    async fn check(&self, uri: Url, text: String, version: Option<i32>) {
        let diagnostics = deco::parse(text.as_bytes())
            .iter()
            .map(|e| to_lsp_diagnostic(&text, e))
            .collect::<Vec<_>>();
        tracing::debug!(%uri, count = diagnostics.len(), "checked document");
        self.documents.write().insert(uri.clone(), text);
        if self.has_publish_diagnostics() {
            self.client
                .publish_diagnostics(uri, diagnostics, version)
                .await;
        }
    }
}

#[async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        {
            let mut lock = self.client_capabilities.write();
            *lock = params.capabilities.clone();
        }
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncKind::FULL.into()),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        self.client
            .log_message(MessageType::INFO, "deco server initialized")
            .await;
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        self.check(document.uri, document.text, Some(document.version))
            .await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change holds the whole text.
        if let Some(change) = params.content_changes.into_iter().last() {
            self.check(
                params.text_document.uri,
                change.text,
                Some(params.text_document.version),
            )
            .await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.documents.write().remove(&uri);
        if self.has_publish_diagnostics() {
            self.client.publish_diagnostics(uri, vec![], None).await;
        }
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let position = params.text_document_position_params;
        let found = {
            let documents = self.documents.read();
            documents
                .get(&position.text_document.uri)
                .and_then(|text| {
                    token_at(text, position.position).map(|token| {
                        let range = token_range(text, &token);
                        (token, range)
                    })
                })
        };
        Ok(found.map(|(token, range)| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("`{}` ({})", token.lexeme, token.kind.name()),
            }),
            range: Some(range),
        }))
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

/// Converts a 1-based byte column into an LSP position, which counts UTF-16
/// code units.
fn position(text: &str, line: u32, column: u32) -> Position {
    let line = line.saturating_sub(1);
    let line_text = text.split('\n').nth(line as usize).unwrap_or("");
    let mut at = (column.saturating_sub(1) as usize).min(line_text.len());
    while !line_text.is_char_boundary(at) {
        at += 1;
    }
    let character = line_text[..at]
        .chars()
        .map(|ch| ch.len_utf16() as u32)
        .sum();
    Position { line, character }
}

fn span(text: &str, line: u32, column: u32, width: u32) -> Range {
    Range {
        start: position(text, line, column),
        end: position(text, line, column + width.max(1)),
    }
}

fn token_range(text: &str, token: &Token) -> Range {
    let width = token.lexeme.lines().next().map_or(0, |l| l.len()) as u32;
    span(text, token.line, token.column, width)
}

pub fn to_lsp_diagnostic(text: &str, error: &ParseError) -> Diagnostic {
    let (line, column) = error.position();
    let width = match error {
        ParseError::Lexical(LexError::InvalidToken { lexeme, .. }) => lexeme.len() as u32,
        ParseError::Lexical(LexError::TooLong { len, .. }) => *len as u32,
        ParseError::Lexical(LexError::UnterminatedComment { .. }) => 2,
        ParseError::Syntax(_) => 1,
    };
    Diagnostic {
        range: span(text, line, column, width),
        severity: Some(DiagnosticSeverity::ERROR),
        code: None,
        code_description: None,
        source: Some("deco".to_string()),
        message: error.to_string(),
        related_information: None,
        tags: None,
        data: None,
    }
}

/// Finds the token covering `at`, if any. Positions are 0-based as in LSP.
pub fn token_at(text: &str, at: Position) -> Option<Token> {
    deco::Lexer::new(text.as_bytes())
        .take_while(|token| token.line <= at.line + 1)
        .filter(|token| !token.is(TokenKind::Eof))
        .find(|token| {
            let range = token_range(text, token);
            range.start.line == at.line
                && range.start.character <= at.character
                && at.character < range.end.character
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_diagnostic() {
        let text = "main ( ) : void { if }";
        let errors = deco::parse(text.as_bytes());
        assert_eq!(errors.len(), 1);
        let diagnostic = to_lsp_diagnostic(text, &errors[0]);
        assert_eq!(diagnostic.range.start, Position::new(0, 21));
        assert_eq!(diagnostic.range.end, Position::new(0, 22));
        assert_eq!(
            diagnostic.message,
            "SyntaxError(1,22)[Expected ( but got }.]"
        );
        assert_eq!(diagnostic.severity, Some(DiagnosticSeverity::ERROR));
    }

    #[test]
    fn test_lexical_diagnostic_covers_lexeme() {
        let text = "main():void{\n  int ab$c;\n}";
        let errors = deco::parse(text.as_bytes());
        let diagnostic = to_lsp_diagnostic(text, &errors[0]);
        assert_eq!(
            diagnostic.range,
            Range::new(Position::new(1, 6), Position::new(1, 11))
        );
    }

    #[test]
    fn test_token_at() {
        let text = "main():void{\n  int count;\n}";
        let token = token_at(text, Position::new(1, 8)).unwrap();
        assert_eq!(token.kind, TokenKind::Ident);
        assert_eq!(token.lexeme, "count");

        let token = token_at(text, Position::new(0, 0)).unwrap();
        assert_eq!(token.kind, TokenKind::Main);

        assert_eq!(token_at(text, Position::new(1, 0)), None);
        assert_eq!(token_at(text, Position::new(5, 0)), None);
    }

    #[test]
    fn test_columns_count_utf16_units() {
        let text = "main():void{ /* \u{e9}\u{1F600} */ if }";
        let errors = deco::parse(text.as_bytes());
        assert_eq!(errors[0].position(), (1, 30));
        let diagnostic = to_lsp_diagnostic(text, &errors[0]);
        assert_eq!(
            diagnostic.range,
            Range::new(Position::new(0, 26), Position::new(0, 27))
        );

        let token = token_at(text, Position::new(0, 26)).unwrap();
        assert_eq!(token.kind, TokenKind::CloseBrace);
        assert_eq!(token_at(text, Position::new(0, 24)).map(|t| t.kind), Some(TokenKind::If));
    }
}
