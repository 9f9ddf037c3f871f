/// HTML assembler
///
/// Turns an authored HTML fragment plus its CSS into one self-contained
/// HTML5 document. Output depends only on the inputs, so republishing the
/// same page always produces byte-identical objects.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<html(?:\s[^>]*)?>").expect("valid html tag regex"));

static HEAD_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<head(?:\s[^>]*)?>").expect("valid head tag regex"));

const DOCTYPE: &str = "<!DOCTYPE html>";

/// Build a complete document with `css` inlined in a `<style>` block
pub fn assemble_document(html: &str, css: &str) -> String {
    let style = style_block(css);

    if HTML_TAG.is_match(html) {
        let document = if HEAD_TAG.is_match(html) {
            HEAD_TAG
                .replace(html, |caps: &Captures| format!("{}{}", &caps[0], style))
                .into_owned()
        } else {
            HTML_TAG
                .replace(html, |caps: &Captures| {
                    format!("{}\n<head>{}\n</head>", &caps[0], style)
                })
                .into_owned()
        };

        return if has_doctype(html) {
            document
        } else {
            format!("{DOCTYPE}\n{document}")
        };
    }

    format!(
        "{DOCTYPE}\n<html>\n<head>{style}\n  <meta charset=\"utf-8\"/>\n</head>\n<body>\n{html}\n</body>\n</html>"
    )
}

fn style_block(css: &str) -> String {
    if css.trim().is_empty() {
        String::new()
    } else {
        format!("\n  <style>\n{css}\n  </style>")
    }
}

fn has_doctype(html: &str) -> bool {
    html.trim_start()
        .get(..9)
        .map(|prefix| prefix.eq_ignore_ascii_case("<!doctype"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_fragment_in_shell() {
        let doc = assemble_document("<div>hi</div>", "body{color:red}");

        assert_eq!(doc.matches("<style>").count(), 1);
        assert_eq!(doc.matches("<!DOCTYPE html>").count(), 1);
        assert!(doc.contains("<style>\nbody{color:red}\n  </style>"));
        assert!(doc.contains("<meta charset=\"utf-8\"/>"));
        assert!(doc.contains("<body>\n<div>hi</div>\n</body>"));
        assert!(doc.starts_with("<!DOCTYPE html>\n<html>\n<head>"));
    }

    #[test]
    fn test_empty_css_omits_style_tag() {
        let doc = assemble_document("<div>hi</div>", "");
        assert!(!doc.contains("<style"));

        let doc = assemble_document("<div>hi</div>", "   \n ");
        assert!(!doc.contains("<style"));
    }

    #[test]
    fn test_injects_into_existing_head() {
        let html = "<html lang=\"en\"><head><title>Shop</title></head><body>x</body></html>";
        let doc = assemble_document(html, "h1{margin:0}");

        assert!(doc.starts_with("<!DOCTYPE html>\n<html lang=\"en\"><head>\n  <style>"));
        assert!(doc.contains("</style><title>Shop</title></head>"));
        assert_eq!(doc.matches("<head>").count(), 1);
        assert!(!doc.contains("charset"));
    }

    #[test]
    fn test_head_with_attributes() {
        let doc = assemble_document("<HTML><HEAD data-x=\"1\"></HEAD></HTML>", "a{}");
        assert!(doc.contains("<HEAD data-x=\"1\">\n  <style>\na{}\n  </style></HEAD>"));
    }

    #[test]
    fn test_synthesizes_head_when_missing() {
        let doc = assemble_document("<html><body><header>top</header></body></html>", "p{}");

        assert!(doc.contains("<html>\n<head>\n  <style>\np{}\n  </style>\n</head><body>"));
        assert!(doc.contains("<header>top</header>"));
    }

    #[test]
    fn test_keeps_existing_doctype() {
        let doc = assemble_document("  <!doctype html><html><head></head></html>", "");
        assert_eq!(doc.to_ascii_lowercase().matches("<!doctype").count(), 1);
        assert!(doc.starts_with("  <!doctype html>"));
    }

    #[test]
    fn test_css_is_inserted_verbatim() {
        let css = ".price::after{content:\"$1 $0\"}";
        let doc = assemble_document("<html><head></head></html>", css);
        assert!(doc.contains(css));
    }

    #[test]
    fn test_output_is_deterministic() {
        let a = assemble_document("<section>same</section>", "p{color:blue}");
        let b = assemble_document("<section>same</section>", "p{color:blue}");
        assert_eq!(a, b);
    }
}
