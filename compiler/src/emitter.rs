const INDENT: &str = "    ";

/// Append-only text sink for generated Solidity. Tracks the current
/// indentation and nothing else.
#[derive(Debug, Default)]
pub struct CodeEmitter {
    buf:    String,
    indent: usize,
}

impl CodeEmitter {
    pub fn new() -> CodeEmitter {
        CodeEmitter::default()
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn unindent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// Writes one line at the current indentation.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent {
                self.buf.push_str(INDENT);
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    /// Empty lines never carry trailing indentation.
    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Opens a `header {` block and indents.
    pub fn open(&mut self, header: impl AsRef<str>) {
        self.line(format!("{} {{", header.as_ref()));
        self.indent();
    }

    /// Unindents and closes the innermost block.
    pub fn close(&mut self) {
        self.unindent();
        self.line("}");
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}
