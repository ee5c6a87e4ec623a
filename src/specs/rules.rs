use std::sync::LazyLock;

use regex::{Captures, Regex};

// Word boundaries and digits are ASCII-only throughout the table.
static STORAGE_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?-u:\b)(?:ssd|hd)(?-u:\b)").unwrap());
static STORAGE_ATTACHED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(?:ssd|hd)(?-u:\b)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Processor,
    Ram,
    Storage,
    Gpu,
    Screen,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Processor => "processor",
            Field::Ram => "ram",
            Field::Storage => "storage",
            Field::Gpu => "gpu",
            Field::Screen => "screen",
        }
    }
}

/// How a compiled pattern turns its matches into a normalized token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Post {
    /// Whole first match, trimmed and uppercased.
    Span,
    /// Group 1 of the first match, trimmed and uppercased.
    Group,
    /// First match whose text contains the label. Emits `<N>GB`.
    Labeled(&'static str),
    /// First match with no storage word anywhere after it on the line. Emits `<N>GB`.
    NoStorageAhead,
    /// First match not directly followed by a storage word. Emits `<N>GB`.
    NoStorageAttached,
    /// `<N><UNIT>[ <KIND>]`, preferring the first match that names its kind.
    SizeWithKind,
    /// Group 1 followed by a literal `"`.
    Inches,
}

#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub field: Field,
    pub pattern: &'static str,
    pub post: Post,
}

/// Rows for the same field are tried top to bottom; the first that resolves wins.
pub const RULES: &[Rule] = &[
    Rule {
        field: Field::Processor,
        pattern: r"(?i)(i[3579]|ryzen\s*[3579])(\s*-\s*[0-9A-Za-z_]+)?",
        post: Post::Span,
    },
    Rule {
        field: Field::Ram,
        pattern: r"(?i)([0-9]+)\s*(GB|G)\s*(DE\s*)?(RAM)?",
        post: Post::Labeled("RAM"),
    },
    Rule {
        field: Field::Ram,
        pattern: r"(?i)([0-9]+)(gb|g)(?-u:\b)",
        post: Post::NoStorageAhead,
    },
    Rule {
        field: Field::Ram,
        pattern: r"(?i)([0-9]+)(gb|g)(?-u:\b)",
        post: Post::NoStorageAttached,
    },
    Rule {
        field: Field::Storage,
        pattern: r"(?i)([0-9]+)\s*(GB|TB)\s*(SSD|HD)?",
        post: Post::SizeWithKind,
    },
    Rule {
        field: Field::Gpu,
        pattern: r"(?i)(RTX|GTX|Radeon|Iris\s*Xe|UHD\s*Graphics|AMD\s*Radeon)",
        post: Post::Group,
    },
    Rule {
        field: Field::Screen,
        pattern: r"(?i)([0-9]{2}\.?[0-9]?)\s*(''|polegadas|pol)",
        post: Post::Inches,
    },
];

impl Post {
    pub fn apply(self, re: &Regex, title: &str) -> Option<String> {
        match self {
            Post::Span => re.find(title).map(|m| m.as_str().trim().to_uppercase()),
            Post::Group => re
                .captures(title)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().trim().to_uppercase()),
            Post::Labeled(label) => {
                let label = label.to_uppercase();
                re.captures_iter(title)
                    .find(|c| c[0].to_uppercase().contains(&label))
                    .and_then(|c| gigabytes(&c))
            }
            // A storage word anywhere later on the same line disqualifies a
            // candidate, so only the last storage word per line matters.
            Post::NoStorageAhead => title.split('\n').find_map(|line| {
                let last = STORAGE_WORD_RE.find_iter(line).last().map(|m| m.start());
                re.captures_iter(line)
                    .find(|c| match (last, c.get(0)) {
                        (Some(start), Some(m)) => m.end() > start,
                        _ => true,
                    })
                    .and_then(|c| gigabytes(&c))
            }),
            Post::NoStorageAttached => re
                .captures_iter(title)
                .find(|c| !STORAGE_ATTACHED_RE.is_match(rest(title, c)))
                .and_then(|c| gigabytes(&c)),
            Post::SizeWithKind => {
                let all: Vec<Captures> = re.captures_iter(title).collect();
                let pick = all
                    .iter()
                    .find(|c| c.get(3).is_some())
                    .or_else(|| all.first())?;
                let size = format!(
                    "{}{}",
                    pick.get(1)?.as_str(),
                    pick.get(2)?.as_str().to_uppercase()
                );
                match pick.get(3) {
                    Some(kind) => Some(format!("{} {}", size, kind.as_str().to_uppercase())),
                    None => Some(size),
                }
            }
            Post::Inches => re
                .captures(title)
                .and_then(|c| c.get(1))
                .map(|m| format!("{}\"", m.as_str())),
        }
    }
}

fn gigabytes(caps: &Captures) -> Option<String> {
    caps.get(1).map(|n| format!("{}GB", n.as_str()))
}

/// Text after the whole match.
fn rest<'t>(title: &'t str, caps: &Captures) -> &'t str {
    caps.get(0).map_or("", |m| &title[m.end()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(field: Field, post: Post) -> Regex {
        let r = RULES
            .iter()
            .find(|r| r.field == field && r.post == post)
            .unwrap();
        Regex::new(r.pattern).unwrap()
    }

    #[test]
    fn all_patterns_compile() {
        for r in RULES {
            assert!(Regex::new(r.pattern).is_ok(), "{}", r.pattern);
        }
    }

    #[test]
    fn processor_keeps_model_suffix() {
        let re = rule(Field::Processor, Post::Span);
        assert_eq!(Post::Span.apply(&re, "Intel i7 - 1255u").as_deref(), Some("I7 - 1255U"));
        assert_eq!(Post::Span.apply(&re, "AMD Ryzen7 5700U").as_deref(), Some("RYZEN7"));
        assert_eq!(Post::Span.apply(&re, "Celeron N4020"), None);
    }

    #[test]
    fn ram_label_accepts_de_ram() {
        let re = rule(Field::Ram, Post::Labeled("RAM"));
        let post = Post::Labeled("RAM");
        assert_eq!(post.apply(&re, "256GB SSD 8GB de RAM").as_deref(), Some("8GB"));
        assert_eq!(post.apply(&re, "256GB SSD 8GB"), None);
    }

    #[test]
    fn ram_lookahead_rejects_any_later_storage_word() {
        let re = rule(Field::Ram, Post::NoStorageAhead);
        let post = Post::NoStorageAhead;
        assert_eq!(post.apply(&re, "8GB 256GB SSD"), None);
        assert_eq!(post.apply(&re, "512GB SSD 8GB").as_deref(), Some("8GB"));
        // "hdmi" is not a storage word
        assert_eq!(post.apply(&re, "4GB HDMI").as_deref(), Some("4GB"));
    }

    #[test]
    fn ram_lookahead_stops_at_line_end() {
        let re = rule(Field::Ram, Post::NoStorageAhead);
        let post = Post::NoStorageAhead;
        assert_eq!(post.apply(&re, "8GB\n256GB SSD").as_deref(), Some("8GB"));
        assert_eq!(post.apply(&re, "8GB SSD\n4GB").as_deref(), Some("4GB"));
    }

    #[test]
    fn storage_word_boundary_is_ascii() {
        // "ssdé" still ends a word, as "é" is not an ASCII word character
        let re = rule(Field::Ram, Post::NoStorageAhead);
        assert_eq!(Post::NoStorageAhead.apply(&re, "8GB ssd\u{e9}"), None);
    }

    #[test]
    fn ram_attached_only_rejects_adjacent_storage_word() {
        let re = rule(Field::Ram, Post::NoStorageAttached);
        let post = Post::NoStorageAttached;
        assert_eq!(post.apply(&re, "8GB 256GB SSD").as_deref(), Some("8GB"));
        assert_eq!(post.apply(&re, "256GB SSD"), None);
    }

    #[test]
    fn storage_prefers_typed_size() {
        let re = rule(Field::Storage, Post::SizeWithKind);
        let post = Post::SizeWithKind;
        assert_eq!(post.apply(&re, "16GB RAM 1tb ssd").as_deref(), Some("1TB SSD"));
        assert_eq!(post.apply(&re, "16GB RAM 1 TB").as_deref(), Some("16GB"));
        assert_eq!(post.apply(&re, "500 GB hd").as_deref(), Some("500GB HD"));
    }

    #[test]
    fn gpu_and_screen() {
        let gpu = rule(Field::Gpu, Post::Group);
        assert_eq!(Post::Group.apply(&gpu, "Intel Iris Xe").as_deref(), Some("IRIS XE"));
        assert_eq!(Post::Group.apply(&gpu, "amd radeon vega").as_deref(), Some("AMD RADEON"));

        let screen = rule(Field::Screen, Post::Inches);
        assert_eq!(Post::Inches.apply(&screen, "Tela 14 pol").as_deref(), Some("14\""));
        assert_eq!(Post::Inches.apply(&screen, "Tela 15,6 POL").as_deref(), None);
        assert_eq!(Post::Inches.apply(&screen, "13.3'' Full HD").as_deref(), Some("13.3\""));
    }
}
