//! Markdown table of contents with GitHub-flavored anchor slugs.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static RE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{2,6})[[:blank:]]+(.*?)[[:blank:]#]*$").unwrap());

static RE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[[:blank:]]*(```|~~~)").unwrap());

/// Nested `- [Title](#slug)` entries for every `##`-or-deeper heading
/// outside fenced code blocks.
pub fn generate_toc<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let mut toc = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut in_fence = false;

    for line in lines {
        let line = line.as_ref();
        if RE_FENCE.is_match(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        let Some(caps) = RE_HEADING.captures(line) else {
            continue;
        };
        let level = caps[1].len();
        let title = &caps[2];
        if title.is_empty() {
            continue;
        }

        let slug = unique_slug(github_slug(title), &mut seen);
        toc.push(format!(
            "{}- [{}](#{})",
            "  ".repeat(level - 2),
            title,
            slug
        ));
    }
    toc
}

/// GitHub appends `-1`, `-2`, ... to repeated anchors.
fn unique_slug(slug: String, seen: &mut HashMap<String, usize>) -> String {
    let count = seen.entry(slug.clone()).or_insert(0);
    let unique = if *count == 0 {
        slug
    } else {
        format!("{}-{}", slug, count)
    };
    *count += 1;
    unique
}

/// GitHub heading anchor slug generation:
/// - lowercase
/// - drop everything but alphanumerics, space, underscore and hyphen
/// - replace spaces with hyphens
pub fn github_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
            slug.push(c);
        }
    }
    slug.replace(' ', "-")
}
