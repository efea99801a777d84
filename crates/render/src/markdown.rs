use crate::Render;
use pulldown_cmark::{Options, Parser, html};

/// CommonMark renderer with the GitHub-flavoured extensions package READMEs
/// are written against (tables, strikethrough, task lists).
#[derive(Debug, Clone, Copy)]
pub struct Markdown {
    options: Options,
}
impl Markdown {
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS,
        }
    }

    /// Plain CommonMark, no extensions.
    pub fn commonmark() -> Self {
        Self { options: Options::empty() }
    }
}
impl Default for Markdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Render for Markdown {
    fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        // Rendered HTML is usually a bit larger than its source.
        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, parser);
        tracing::trace!(input = markdown.len(), output = output.len(), "Rendered markdown");
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const README: &str = "# Cassandra\n\nA *distributed* database.\n\n![logo](img/logo.png)\n";

    #[test]
    fn test_render() {
        let html = Markdown::new().render(README);
        assert!(html.contains("<h1>Cassandra</h1>"));
        assert!(html.contains("<em>distributed</em>"));
        assert!(html.contains(r#"<img src="img/logo.png" alt="logo" />"#));
    }

    #[test]
    fn test_render_with_base() {
        let html = Markdown::new().render_with_base(README, "https://raw.example.com/1.8/cassandra");
        assert!(html.contains(r#"<img src="https://raw.example.com/1.8/cassandra/img/logo.png" alt="logo" />"#));
        assert!(!html.contains(r#"src="img/"#));
    }

    #[test]
    fn test_tables_need_extension() {
        let table = "| a | b |\n|---|---|\n| 1 | 2 |\n";
        assert!(Markdown::new().render(table).contains("<table>"));
        assert!(!Markdown::commonmark().render(table).contains("<table>"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(Markdown::new().render(""), "");
    }
}
