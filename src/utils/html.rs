// src/utils/html.rs

use std::sync::LazyLock;

use syntect::{
    highlighting::ThemeSet,
    html::{ClassStyle, ClassedHTMLGenerator, css_for_theme_with_class_style},
    parsing::{SyntaxReference, SyntaxSet},
    util::LinesWithEndings,
};

use crate::config::DEFAULT_SYNTAX;

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };
const THEME: &str = "InspiredGitHub";

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

static THEME_CSS: LazyLock<String> = LazyLock::new(|| {
    let themes = ThemeSet::load_defaults();
    match themes.themes.get(THEME) {
        Some(theme) => css_for_theme_with_class_style(theme, CLASS_STYLE).unwrap_or_else(|e| {
            tracing::warn!("no stylesheet for theme {}: {}", THEME, e);
            String::new()
        }),
        None => String::new(),
    }
});

/// Sanitizes user-written HTML (thread and post bodies) with a tag whitelist.
///
/// Safe tags like <b> and <p> survive; <script>, <iframe> and event-handler
/// attributes are stripped.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

/// Maps a syntax identifier to the token syntect knows it by.
fn syntax_token(syntax: &str) -> &str {
    match syntax {
        "as3" => "as",
        "csharp" => "cs",
        "vb.net" => "vb",
        "xslt" => "xsl",
        other => other,
    }
}

fn find_syntax(syntax: &str) -> &'static SyntaxReference {
    SYNTAXES
        .find_syntax_by_token(syntax_token(syntax))
        .unwrap_or_else(|| SYNTAXES.find_syntax_plain_text())
}

fn highlight(syntax: &str, code: &str) -> Result<String, syntect::Error> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(find_syntax(syntax), &SYNTAXES, CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

/// Highlights code into a self-contained block: the theme stylesheet followed
/// by the classed spans.
///
/// Blank code renders as an empty string. If highlighting fails the code is
/// shown escaped and unstyled.
pub fn render_code(syntax: &str, code: &str) -> String {
    if code.trim().is_empty() {
        return String::new();
    }
    let syntax = if syntax.is_empty() { DEFAULT_SYNTAX } else { syntax };

    let body = highlight(syntax, code).unwrap_or_else(|e| {
        tracing::warn!("highlighting as {} failed: {}", syntax, e);
        ammonia::clean_text(code)
    });

    format!(
        "<div class=\"code\"><style type=\"text/css\">{}</style>\n<pre><code class=\"language-{}\">{}</code></pre></div>\n",
        THEME_CSS.as_str(),
        ammonia::clean_text(syntax),
        body
    )
}
