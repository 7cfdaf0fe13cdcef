use patina::{ScanMetrics, ScanResult, Token};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_run(
    source: &str,
    language: &str,
    result: &ScanResult,
    metrics: Option<&ScanMetrics>,
    color: bool,
) {
    let palette = ansi::Palette::new(color);
    println!("\n{}", palette.bold(palette.paint(format!("⚙  Highlighting with {language}"), ansi::CYAN)));

    println!("\n{}", palette.paint("━━━ Tokens ━━━", ansi::GRAY));
    if result.tokens.is_empty() {
        println!("{}", palette.dim("  (empty input)"));
    }
    for token in &result.tokens {
        print_token(source, token, 1, &palette);
    }

    println!("\n{}", palette.paint("━━━ Summary ━━━", ansi::GRAY));
    println!("  Relevance: {}", palette.paint(result.relevance.to_string(), ansi::GREEN));
    if let Some(metrics) = metrics {
        println!(
            "  Tokens: {}  │  Plain runs: {}  │  Max depth: {}  │  Total: {}",
            palette.paint(metrics.tokens.to_string(), ansi::BLUE),
            palette.dim(metrics.plain_runs.to_string()),
            palette.dim(metrics.max_depth.to_string()),
            palette.paint(format!("{:?}", metrics.total), ansi::GREEN),
        );
    }
    println!();
}

fn print_token(source: &str, token: &Token, indent: usize, palette: &ansi::Palette) {
    let span = palette.paint(format!("{}..{}", token.start, token.end), ansi::YELLOW);
    let tag = if token.is_plain() {
        palette.dim(&token.tag)
    } else {
        palette.paint(&token.tag, tag_color(&token.tag))
    };
    let preview: String = token.text(source).chars().take(48).collect();
    println!(
        "{:indent$}{span} {tag} {} {}",
        "",
        palette.dim("│"),
        palette.bold(format!("{preview:?}")),
        indent = indent * 2,
    );
    for child in &token.children {
        print_token(source, child, indent + 1, palette);
    }
}

fn tag_color(tag: &str) -> &'static str {
    match tag {
        "keyword" | "literal" => ansi::MAGENTA,
        "string" => ansi::GREEN,
        "comment" => ansi::GRAY,
        "numbers" => ansi::YELLOW,
        "type" | "built_in" => ansi::CYAN,
        "title" | "title.function" | "variable" => ansi::BLUE,
        _ => ansi::CYAN,
    }
}
