use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

fn options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
    options
}

/// Render Markdown content to HTML.
///
/// ## Example
/// ```rs
/// use vellum::content::markdown::render_markdown;
/// let html = render_markdown("# The amazing spinach");
/// ```
pub fn render_markdown(content: &str) -> String {
    let mut html_output = String::new();
    let mut in_frontmatter = false;

    let events = Parser::new_ext(content, options()).filter(|event| match event {
        Event::Start(Tag::MetadataBlock(_)) => {
            in_frontmatter = true;
            false
        }
        Event::End(TagEnd::MetadataBlock(_)) => {
            in_frontmatter = false;
            false
        }
        _ => !in_frontmatter,
    });

    pulldown_cmark::html::push_html(&mut html_output, events);
    html_output
}

/// Plain text of the first paragraphs of `content`, cut at a word boundary after at most `max_chars` characters.
///
/// Used when an entry has no excerpt of its own. Headings, code and raw HTML are left out.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let mut text = String::new();
    let mut skip_depth = 0usize;

    for event in Parser::new_ext(content, options()) {
        match event {
            Event::Start(Tag::Heading { .. } | Tag::CodeBlock(_) | Tag::MetadataBlock(_)) => {
                skip_depth += 1
            }
            Event::End(TagEnd::Heading(_) | TagEnd::CodeBlock | TagEnd::MetadataBlock(_)) => {
                skip_depth = skip_depth.saturating_sub(1)
            }
            Event::Text(chunk) | Event::Code(chunk) if skip_depth == 0 => {
                text.push_str(&chunk);
            }
            Event::SoftBreak | Event::HardBreak | Event::End(TagEnd::Paragraph) if skip_depth == 0 => {
                if !text.ends_with(' ') && !text.is_empty() {
                    text.push(' ');
                }
            }
            _ => {}
        }

        if text.chars().count() > max_chars {
            break;
        }
    }

    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    let cut = match cut.rfind(char::is_whitespace) {
        Some(index) => &cut[..index],
        None => cut.as_str(),
    };

    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_markdown() {
        let html = render_markdown("# Mögnuð spínat\n\nSpínat er einn **mesti** fjársjóður heims.");
        assert!(html.contains("<h1>Mögnuð spínat</h1>"));
        assert!(html.contains("<strong>mesti</strong>"));
    }

    #[test]
    fn test_render_markdown_skips_frontmatter() {
        let html = render_markdown("---\ntitle: hidden\n---\n\nVisible");
        assert!(!html.contains("hidden"));
        assert!(html.contains("<p>Visible</p>"));
    }

    #[test]
    fn test_excerpt_skips_headings() {
        let excerpt = excerpt("# The amazing spinach\n\nSpinach is one of the world's greatest treasures.", 200);
        assert_eq!(excerpt, "Spinach is one of the world's greatest treasures.");
    }

    #[test]
    fn test_excerpt_cuts_at_word_boundary() {
        let excerpt = excerpt("Vegetables make great pets. Be sure to neuter your vegetable.", 20);
        assert_eq!(excerpt, "Vegetables make…");
    }
}
