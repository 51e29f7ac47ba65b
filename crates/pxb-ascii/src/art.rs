use std::fmt;

/// Rendered ASCII art: rows of exactly `width` glyphs.
///
/// # Example
/// ```
/// use pxb_ascii::AsciiArt;
/// let art = AsciiArt::new(2, vec!["@.".into(), ". ".into()], 0);
/// assert_eq!(art.to_text(), "@.\n. \n");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsciiArt {
    width: u32,
    lines: Vec<String>,
    dropped_rows: usize,
}

impl AsciiArt {
    /// Assemble art from already rendered rows.
    #[must_use]
    pub fn new(width: u32, lines: Vec<String>, dropped_rows: usize) -> Self {
        Self {
            width,
            lines,
            dropped_rows,
        }
    }

    /// Glyphs per row.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Emitted rows, top to bottom.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Rows cut by the character budget. Never shown to the user.
    #[must_use]
    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    /// Every row followed by `\n`.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.lines.len() * (self.width as usize + 1));
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Fenced MarkdownV2 code block ready for `parse_mode = MarkdownV2`.
    ///
    /// # Example
    /// ```
    /// use pxb_ascii::AsciiArt;
    /// let art = AsciiArt::new(2, vec!["`\\".into()], 0);
    /// assert_eq!(art.to_markdown_block(), "```\n\\`\\\\\n\n```");
    /// ```
    #[must_use]
    pub fn to_markdown_block(&self) -> String {
        format!("```\n{}\n```", escape_code(&self.to_text()))
    }

    /// Drop trailing rows until [`AsciiArt::to_markdown_block`] is at most
    /// `budget` characters. Removed rows are added to `dropped_rows`.
    pub fn fit_markdown(&mut self, budget: usize) {
        let mut total = FENCE_CHARS;
        let kept = self
            .lines
            .iter()
            .take_while(|line| {
                total += escaped_len(line) + 1;
                total <= budget
            })
            .count();
        self.dropped_rows += self.lines.len() - kept;
        self.lines.truncate(kept);
    }
}

/// "```\n" before the text, "\n```" after it.
const FENCE_CHARS: usize = 8;

impl fmt::Display for AsciiArt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Escape text for a MarkdownV2 `pre` block: only `` ` `` and `\` are special there.
#[must_use]
pub fn escape_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '`' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn escaped_len(text: &str) -> usize {
    text.chars()
        .map(|ch| if matches!(ch, '`' | '\\') { 2 } else { 1 })
        .sum()
}
