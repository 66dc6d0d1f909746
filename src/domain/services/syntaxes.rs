use once_cell::sync::Lazy;
use ratatui::style::Color;
use syntect::highlighting::Color as SyntectColor;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;

pub static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

pub struct Syntaxes {}

impl Syntaxes {
    pub fn list() -> Vec<String> {
        let mut syntaxes = SYNTAX_SET
            .syntaxes()
            .iter()
            .map(|e| return e.name.to_string())
            .collect::<Vec<String>>();
        syntaxes.sort();

        return syntaxes;
    }

    /// Resolves a language name or file extension. TypeScript and JSX flavours
    /// fall back to JavaScript, as that's the closest bundled grammar.
    pub fn get(name: &str) -> &'static SyntaxReference {
        let name = name.trim().to_lowercase();
        let candidates = match name.as_str() {
            "tsx" | "jsx" | "ts" | "typescript" | "react" => vec!["js".to_string()],
            _ => vec![name.to_string()],
        };

        for candidate in candidates {
            if let Some(syntax) = SYNTAX_SET.find_syntax_by_token(&candidate) {
                return syntax;
            }
        }

        return SYNTAX_SET.find_syntax_plain_text();
    }

    pub fn translate_colour(colour: SyntectColor) -> Option<Color> {
        if colour.a == 0 {
            return None;
        }

        return Some(Color::Rgb(colour.r, colour.g, colour.b));
    }
}
