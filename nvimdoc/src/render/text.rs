//! Fixed-width text helpers for the vimdoc renderer.

/// Greedy word wrap. The first line starts with `indent`, the rest with
/// `subsequent`. Words too long for a line are split so no line exceeds
/// `width` (unless the indent alone does).
pub fn wrap(text: &str, width: usize, indent: &str, subsequent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = indent.to_string();
    let mut current_len = indent.chars().count();
    let mut prefix_len = current_len;

    for word in text.split_whitespace() {
        for piece in split_long(word, width.saturating_sub(subsequent.chars().count()).max(1)) {
            let piece_len = piece.chars().count();
            let needs_space = current_len > prefix_len;
            let projected = current_len + usize::from(needs_space) + piece_len;
            if needs_space && projected > width {
                lines.push(std::mem::replace(&mut current, subsequent.to_string()));
                current_len = subsequent.chars().count();
                prefix_len = current_len;
            } else if needs_space {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(&piece);
            current_len += piece_len;
        }
    }

    if current_len > prefix_len || lines.is_empty() {
        lines.push(current.trim_end().to_string());
    }
    lines
}

fn split_long(word: &str, max: usize) -> Vec<String> {
    let chars: Vec<char> = word.chars().collect();
    if chars.len() <= max {
        return vec![word.to_string()];
    }
    chars.chunks(max).map(|c| c.iter().collect()).collect()
}

/// Wrap every paragraph (separated by blank lines) and keep a blank line
/// between them.
pub fn wrap_paragraphs(text: &str, width: usize, indent: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, paragraph) in text.split("\n\n").filter(|p| !p.trim().is_empty()).enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.extend(wrap(paragraph, width, indent, indent));
    }
    lines
}

/// `left` and `right` on one line with `right` flush against `width`; two
/// lines when they do not fit.
pub fn leftright(left: &str, right: &str, width: usize) -> Vec<String> {
    let left_len = left.chars().count();
    let right_len = right.chars().count();
    if left_len + 1 + right_len <= width {
        let gap = width - left_len - right_len;
        return vec![format!("{}{}{}", left, " ".repeat(gap), right)];
    }
    let pad = width.saturating_sub(right_len);
    vec![left.to_string(), format!("{}{}", " ".repeat(pad), right)]
}

/// Neutralize `*tag*` and `|link|` syntax in running text. A word made of
/// `>` plus an optional language name also gets escaped, since wrapping may
/// leave it at the end of a line where it would open a code block.
pub fn escape_text(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        let word_start = i == 0 || chars[i - 1].is_whitespace();
        if c == '*' || c == '|' || (c == '>' && word_start && opens_example(&chars[i + 1..])) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn opens_example(rest: &[char]) -> bool {
    rest.iter()
        .take_while(|c| !c.is_whitespace())
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

/// Make a string usable inside a `*tag*` or `|tag|` token.
pub fn escape_tag(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '*' | '|' | '%' => out.push_str(&format!("%{:02X}", c as u32)),
            c if c.is_whitespace() => out.push_str(&format!("%{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn wraps_at_width() {
        let lines = wrap("the quick brown fox jumps over the lazy dog", 20, "    ", "    ");
        assert_eq!(
            lines,
            vec!["    the quick brown", "    fox jumps over", "    the lazy dog"]
        );
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn splits_words_longer_than_the_line() {
        let lines = wrap("abcdefghijkl", 8, "  ", "  ");
        assert_eq!(lines, vec!["  abcdef", "  ghijkl"]);
    }

    #[test]
    fn hanging_indent() {
        let lines = wrap("{name} `string` Name of the session", 24, "  ", "      ");
        assert_eq!(lines, vec!["  {name} `string` Name", "      of the session"]);
    }

    #[test]
    fn empty_text_yields_one_line() {
        assert_eq!(wrap("", 80, "    ", "    "), vec![""]);
    }

    #[test]
    fn paragraphs_keep_blank_line() {
        let lines = wrap_paragraphs("one two\n\nthree", 80, "  ");
        assert_eq!(lines, vec!["  one two", "", "  three"]);
    }

    #[test]
    fn leftright_alignment() {
        assert_eq!(leftright("load()", "*m.load*", 20), vec!["load()      *m.load*"]);
        assert_eq!(
            leftright("a_very_long_signature()", "*tag*", 20),
            vec!["a_very_long_signature()", "               *tag*"]
        );
    }

    #[test]
    fn wrapped_prose_never_ends_in_a_code_block_marker() {
        let lines = wrap(&escape_text("Pipe the result > into the next step"), 20, "", "");
        assert_eq!(lines, vec!["Pipe the result \\>", "into the next step"]);
        assert!(lines.iter().all(|l| !l.ends_with(" >")));
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_text("a|b *c*"), "a\\|b \\*c\\*");
        assert_eq!(escape_text("a > b >lua c->d x>"), "a \\> b \\>lua c->d x>");
        assert_eq!(escape_text(">= 2"), ">= 2");
        assert_eq!(escape_tag("m.f*o|o x"), "m.f%2Ao%7Co%20x");
    }
}
