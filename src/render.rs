use colored::{Color, Colorize};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::config::ServiceId;

/// Prints a response inside the framed block, rendering markdown to
/// ANSI-styled text unless the service has it disabled.
pub fn print_response(service: ServiceId, text: &str, markdown: bool) {
    println!("\n{}", format!("--- {} Response ---", service.display_name()).green());
    if markdown {
        print!("{}", render_markdown(text));
    } else {
        println!("{text}");
    }
    println!("{}", "-----------------------".green());
}

#[derive(Debug, Clone, Copy, Default)]
struct InlineStyle {
    color: Option<Color>,
    bold: bool,
    italic: bool,
}

impl InlineStyle {
    fn paint(&self, text: &str) -> String {
        let mut styled = match self.color {
            Some(color) => text.color(color),
            None => text.normal(),
        };
        if self.bold {
            styled = styled.bold();
        }
        if self.italic {
            styled = styled.italic();
        }
        styled.to_string()
    }
}

fn current(styles: &[InlineStyle]) -> InlineStyle {
    styles.last().copied().unwrap_or_default()
}

/// Converts markdown to terminal text: colored headings, bullets, fenced
/// code blocks, and bold/italic/code inline styling.
pub fn render_markdown(input: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    let parser = Parser::new_ext(input, options);

    let mut out = String::new();
    let mut line = String::new();
    let mut styles = vec![InlineStyle::default()];
    let mut in_code_block = false;
    let mut code_block = String::new();
    let mut list_depth: usize = 0;

    for event in parser {
        match event {
            Event::Start(tag) => {
                let style = match tag {
                    Tag::Heading { level, .. } => {
                        flush_line(&mut out, &mut line);
                        let (prefix, color) = match level {
                            HeadingLevel::H1 => ("# ", Color::Cyan),
                            HeadingLevel::H2 => ("## ", Color::Blue),
                            HeadingLevel::H3 => ("### ", Color::Green),
                            _ => ("#### ", Color::Yellow),
                        };
                        let style = InlineStyle {
                            color: Some(color),
                            bold: true,
                            italic: false,
                        };
                        line.push_str(&style.paint(prefix));
                        style
                    }
                    Tag::Emphasis => InlineStyle {
                        italic: true,
                        ..current(&styles)
                    },
                    Tag::Strong => InlineStyle {
                        bold: true,
                        ..current(&styles)
                    },
                    Tag::CodeBlock(kind) => {
                        in_code_block = true;
                        code_block.clear();
                        flush_line(&mut out, &mut line);
                        let lang = match kind {
                            CodeBlockKind::Fenced(lang) => lang.to_string(),
                            CodeBlockKind::Indented => String::new(),
                        };
                        out.push_str(&"```".dimmed().to_string());
                        if !lang.is_empty() {
                            out.push_str(&lang.magenta().to_string());
                        }
                        out.push('\n');
                        current(&styles)
                    }
                    Tag::List(_) => {
                        list_depth += 1;
                        flush_line(&mut out, &mut line);
                        current(&styles)
                    }
                    Tag::Item => {
                        let indent = "  ".repeat(list_depth.saturating_sub(1));
                        line.push_str(&indent);
                        line.push_str(&"• ".yellow().to_string());
                        current(&styles)
                    }
                    Tag::Link { .. } => {
                        line.push_str(&"[".blue().to_string());
                        InlineStyle {
                            color: Some(Color::Blue),
                            ..current(&styles)
                        }
                    }
                    Tag::BlockQuote(_) => {
                        flush_line(&mut out, &mut line);
                        line.push_str(&"│ ".dimmed().to_string());
                        InlineStyle {
                            italic: true,
                            ..current(&styles)
                        }
                    }
                    _ => current(&styles),
                };
                styles.push(style);
            }
            Event::End(tag) => {
                styles.pop();
                match tag {
                    TagEnd::Heading(_) | TagEnd::Paragraph => {
                        flush_line(&mut out, &mut line);
                        out.push('\n');
                    }
                    TagEnd::Item => {
                        flush_line(&mut out, &mut line);
                    }
                    TagEnd::CodeBlock => {
                        in_code_block = false;
                        for code_line in code_block.lines() {
                            out.push_str(&code_line.yellow().to_string());
                            out.push('\n');
                        }
                        out.push_str(&"```".dimmed().to_string());
                        out.push('\n');
                        code_block.clear();
                    }
                    TagEnd::List(_) => {
                        list_depth = list_depth.saturating_sub(1);
                        if list_depth == 0 {
                            out.push('\n');
                        }
                    }
                    TagEnd::Link => {
                        line.push_str(&"]".blue().to_string());
                    }
                    TagEnd::BlockQuote(_) => {
                        flush_line(&mut out, &mut line);
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if in_code_block {
                    code_block.push_str(&text);
                } else {
                    line.push_str(&current(&styles).paint(&text));
                }
            }
            Event::Code(code) => {
                line.push_str(&format!("`{code}`").yellow().to_string());
            }
            Event::SoftBreak | Event::HardBreak => {
                flush_line(&mut out, &mut line);
            }
            Event::Rule => {
                flush_line(&mut out, &mut line);
                out.push_str(&"─".repeat(20).dimmed().to_string());
                out.push('\n');
            }
            _ => {}
        }
    }
    flush_line(&mut out, &mut line);

    let mut rendered = out.trim_end().to_string();
    rendered.push('\n');
    rendered
}

fn flush_line(out: &mut String, line: &mut String) {
    if !line.is_empty() {
        out.push_str(line);
        out.push('\n');
        line.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(input: &str) -> String {
        colored::control::set_override(false);
        render_markdown(input)
    }

    #[test]
    fn headings_keep_their_hash_prefix() {
        let rendered = plain("# Title\n\nBody text.");
        assert!(rendered.contains("# Title"));
        assert!(rendered.contains("Body text."));
    }

    #[test]
    fn list_items_become_bullets() {
        let rendered = plain("- first\n- second\n  - nested");
        assert!(rendered.contains("• first"));
        assert!(rendered.contains("• second"));
        assert!(rendered.contains("  • nested"));
    }

    #[test]
    fn fenced_code_blocks_keep_fences_and_content() {
        let rendered = plain("```rust\nlet x = 1;\n```");
        assert!(rendered.contains("```"));
        assert!(rendered.contains("rust"));
        assert!(rendered.contains("let x = 1;"));
    }

    #[test]
    fn inline_code_is_backticked() {
        let rendered = plain("Use the `mask` helper.");
        assert!(rendered.contains("`mask`"));
    }

    #[test]
    fn emphasis_text_survives() {
        let rendered = plain("some **bold** and *italic* words");
        assert!(rendered.contains("bold"));
        assert!(rendered.contains("italic"));
        assert!(!rendered.contains("**"));
    }

    #[test]
    fn output_ends_with_a_single_newline() {
        let rendered = plain("only a paragraph");
        assert!(rendered.ends_with('\n'));
        assert!(!rendered.ends_with("\n\n"));
    }
}
