// Strip markdown from generated aftercare text so it reads as plain text
// on screen and when narrated.

use std::sync::LazyLock;

use regex::Regex;

/// Upper bound on sanitize passes. Real model output settles in one or two.
const MAX_PASSES: usize = 4;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());
static RULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$").unwrap()
});
static HEADER_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(?:#{1,6}[ \t]*)+").unwrap());
static BOLD_STARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*([^*\n]+)\*\*").unwrap());
static BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_\n]+)__").unwrap());
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*\s][^*\n]*)\*").unwrap());
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_\s][^_\n]*)_").unwrap());
static BULLET: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[-*•][ \t]*").unwrap());
static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Remove markdown from model output. Pure and idempotent.
pub fn sanitize(text: &str) -> String {
    let mut current = sanitize_pass(text);
    for _ in 1..MAX_PASSES {
        let next = sanitize_pass(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn sanitize_pass(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = text.replace("\r\n", "\n");

    // Step 1: Code
    let text = FENCED_BLOCK.replace_all(&text, "");
    let text = INLINE_CODE.replace_all(&text, "$1");

    // Step 2: Rules go before bullets, "---" would otherwise become "• --"
    let text = RULE_LINE.replace_all(&text, "");
    let text = HEADER_MARKER.replace_all(&text, "");

    // Step 3: Emphasis, strongest first
    let text = BOLD_STARS.replace_all(&text, "$1");
    let text = BOLD_UNDERSCORES.replace_all(&text, "$1");
    let text = ITALIC_STAR.replace_all(&text, "$1");
    let text = ITALIC_UNDERSCORE.replace_all(&text, "$1");

    // Step 4: Layout
    let text = BULLET.replace_all(&text, "• ");
    let text = BLANK_RUN.replace_all(&text, "\n\n");

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKDOWN_REPLY: &str = "## CUIDADOS GERAIS\n\n\
**Importante:** mantenha repouso.\n\n\
- Aplique gelo\n\
* Evite esforço\n\n\
---\n\n\n\n\
### MEDICAÇÕES\n\
Tome `ibuprofeno` 400mg.\n\
```\ncode\n```\n\
_Retorne_ em 7 dias.";

    #[test]
    fn strips_representative_reply() {
        assert_eq!(
            sanitize(MARKDOWN_REPLY),
            "CUIDADOS GERAIS\n\n\
Importante: mantenha repouso.\n\n\
• Aplique gelo\n\
• Evite esforço\n\n\
MEDICAÇÕES\n\
Tome ibuprofeno 400mg.\n\n\
Retorne em 7 dias."
        );
    }

    #[test]
    fn output_has_no_markdown_tokens() {
        let out = sanitize(MARKDOWN_REPLY);
        for token in ["# ", "**", "`", "---", "__", "\n\n\n"] {
            assert!(!out.contains(token), "{token:?} survived in {out:?}");
        }
    }

    #[test]
    fn idempotent_on_fixtures() {
        let fixtures = [
            MARKDOWN_REPLY,
            "",
            "   ",
            "***negrito e itálico***",
            "a_b_c_d",
            "•sem espaço",
            "  - recuado\n\t* tab",
            "```rust\nfn main() {}\n```",
            "linha\r\n\r\n\r\n\r\noutra",
            "2 * 3 * 4 = 24",
            "# \n#\n######  Título",
            "`sem fechamento",
            "___\n***\n- - -",
            "# # # # # # Título",
        ];
        for input in fixtures {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn stacked_header_markers_strip_in_one_call() {
        assert_eq!(sanitize("# # # # # # Título"), "Título");
        assert_eq!(sanitize("## ### ####### Seção\ntexto"), "Seção\ntexto");
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize("\n\n  \n"), "");
    }

    #[test]
    fn headers_only_stripped_at_line_start() {
        assert_eq!(sanitize("# Título"), "Título");
        assert_eq!(sanitize("Sala #3"), "Sala #3");
    }

    #[test]
    fn emphasis_variants_are_unwrapped() {
        assert_eq!(sanitize("**a** __b__ *c* _d_"), "a b c d");
        assert_eq!(sanitize("***x***"), "x");
    }

    #[test]
    fn spaced_star_is_not_emphasis() {
        assert_eq!(sanitize("2 * 3 * 4"), "2 * 3 * 4");
    }

    #[test]
    fn bullets_are_normalized() {
        assert_eq!(sanitize("- um\n* dois\n•três"), "• um\n• dois\n• três");
    }

    #[test]
    fn rules_are_dropped_not_bulleted() {
        assert_eq!(sanitize("antes\n---\n***\n___\ndepois"), "antes\n\ndepois");
    }

    #[test]
    fn blank_runs_collapse_to_one_blank_line() {
        assert_eq!(sanitize("a\n\n\n\n\nb"), "a\n\nb");
        assert_eq!(sanitize("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn fenced_blocks_are_removed_entirely() {
        assert_eq!(sanitize("antes\n```\nlet x = 1;\n```\ndepois"), "antes\n\ndepois");
    }

    #[test]
    fn numbered_lists_survive() {
        let text = "CUIDADOS GERAIS\n1. Repouso\n2. Gelo";
        assert_eq!(sanitize(text), text);
    }
}
