const SEPARATOR: &str = "// ============================================";

/// The report block for one extracted file.
///
/// Separator, `// File: <path>`, separator, a blank line, the content, then
/// a newline and two blank lines. Contents are written verbatim.
pub fn format_block(path: &str, content: &str) -> String {
    let mut block = String::with_capacity(content.len() + path.len() + 3 * SEPARATOR.len());
    block.push_str(SEPARATOR);
    block.push('\n');
    block.push_str("// File: ");
    block.push_str(path);
    block.push('\n');
    block.push_str(SEPARATOR);
    block.push_str("\n\n");
    block.push_str(content);
    block.push_str("\n\n\n");
    block
}
