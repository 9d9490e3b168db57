//! Outbound text markup. Channel posts travel as HTML, personal readings as
//! MarkdownV2; the two pipelines never mix on a single message.

use regex::Regex;

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Channel pipeline: HTML-escape first, then turn provider `**bold**` /
/// `*bold*` markers into `<b>` tags, unescape `\-`, and collapse runs of
/// three or more newlines down to a blank line.
pub fn to_channel_html(text: &str) -> String {
    let double = Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex");
    let single = Regex::new(r"\*([^*]+)\*").expect("valid regex");

    let mut out = escape_html(text);
    out = double.replace_all(&out, "<b>${1}</b>").into_owned();
    out = single.replace_all(&out, "<b>${1}</b>").into_owned();
    out = out.replace("\\-", "-");
    while out.contains("\n\n\n") {
        out = out.replace("\n\n\n", "\n\n");
    }
    out
}

/// MarkdownV2 pipeline for direct messages. Asterisks stay unescaped so the
/// provider's `*bold*` markup keeps rendering.
pub fn escape_markdown_v2(text: &str) -> String {
    const RESERVED: &[char] = &[
        '_', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
        '/',
    ];
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if RESERVED.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Prefix the first `*bold*` span with an emoji, leaving the rest untouched.
/// Text without a bold span passes through unchanged.
pub fn decorate_first_bold(text: &str, emoji: &str) -> String {
    let re = Regex::new(r"\*([^*]+)\*").expect("valid regex");
    match re.captures(text) {
        Some(caps) => {
            let inner = caps.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
            let decorated = format!("*{emoji} {inner}*");
            re.replace(text, regex::NoExpand(decorated.as_str()))
                .into_owned()
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_html_escapes_then_bolds() {
        assert_eq!(
            to_channel_html("**Привіт** і *світ* & <i>"),
            "<b>Привіт</b> і <b>світ</b> &amp; &lt;i&gt;"
        );
    }

    #[test]
    fn channel_html_collapses_newline_runs() {
        assert_eq!(to_channel_html("а\n\n\n\nб"), "а\n\nб");
        assert_eq!(to_channel_html("а\n\nб"), "а\n\nб");
    }

    #[test]
    fn channel_html_unescapes_literal_hyphens() {
        assert_eq!(to_channel_html("5\\-7 днів"), "5-7 днів");
    }

    #[test]
    fn markdown_v2_escapes_reserved_characters() {
        assert_eq!(
            escape_markdown_v2("Карта (День): ось_так!"),
            "Карта \\(День\\): ось\\_так\\!"
        );
    }

    #[test]
    fn markdown_v2_leaves_asterisks_alone() {
        assert_eq!(escape_markdown_v2("*Сонце* сяє"), "*Сонце* сяє");
    }

    #[test]
    fn markdown_v2_is_identity_on_plain_text() {
        assert_eq!(escape_markdown_v2("Привіт світ"), "Привіт світ");
    }

    #[test]
    fn decorates_only_the_first_bold_span() {
        assert_eq!(
            decorate_first_bold("Карта: * Сонце * і *Місяць*", "🔮"),
            "Карта: *🔮 Сонце* і *Місяць*"
        );
        assert_eq!(decorate_first_bold("без маркерів", "🔮"), "без маркерів");
    }
}
