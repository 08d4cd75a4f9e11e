//! Identifier conversion for generated Rust.

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use", "where",
    "while", "abstract", "become", "box", "do", "final", "macro", "override", "priv", "try",
    "typeof", "unsized", "virtual", "yield",
];

// can't be raw identifiers
const RESERVED: &[&str] = &["self", "Self", "super", "crate"];

/// Converts schema names into Rust identifiers. With `rename` off the names
/// keep their case; only characters Rust can't accept are replaced.
#[derive(Debug, Clone, Copy)]
pub struct Naming {
    pub rename: bool,
}

impl Default for Naming {
    fn default() -> Self {
        Self { rename: true }
    }
}

impl Naming {
    pub fn type_name(&self, raw: &str) -> String {
        let name = if self.rename { pascal_case(raw) } else { sanitize(raw) };
        escape(non_empty(name, "Unnamed"))
    }

    pub fn field_name(&self, raw: &str) -> String {
        let name = if self.rename { snake_case(raw) } else { sanitize(raw) };
        escape(non_empty(name, "field"))
    }

    pub fn variant_name(&self, raw: &str) -> String {
        self.type_name(raw)
    }

    pub fn const_name(&self, raw: &str) -> String {
        escape(non_empty(screaming_case(raw), "VALUE"))
    }
}

pub fn pascal_case(name: &str) -> String {
    split_words(name).iter().map(|w| capitalize(w)).collect()
}

pub fn snake_case(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn screaming_case(name: &str) -> String {
    snake_case(name).to_uppercase()
}

/// `UsersGet` + `photo_sizes` → `UsersGetPhotoSizes`
pub fn inline_type_name(parent: &str, field: &str) -> String {
    format!("{parent}{}", pascal_case(field))
}

fn split_words(name: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut chars = name.chars().peekable();

    while let Some(ch) = chars.next() {
        if !ch.is_alphanumeric() {
            push_word(&mut out, &mut current);
            continue;
        }
        // boundary before an uppercase letter that follows a lowercase one,
        // and between letters and digits
        let boundary = match current.chars().last() {
            Some(prev) => {
                (ch.is_uppercase() && prev.is_lowercase())
                    || (ch.is_numeric() != prev.is_numeric())
                    || (ch.is_uppercase()
                        && prev.is_uppercase()
                        && chars.peek().is_some_and(|next| next.is_lowercase()))
            }
            None => false,
        };
        if boundary {
            push_word(&mut out, &mut current);
        }
        current.push(ch);
    }
    push_word(&mut out, &mut current);
    out
}

fn push_word(out: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        out.push(std::mem::take(current));
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

fn non_empty(name: String, fallback: &str) -> String {
    if name.is_empty() { fallback.to_string() } else { name }
}

fn escape(name: String) -> String {
    if name.starts_with(|c: char| c.is_numeric()) {
        return format!("_{name}");
    }
    if RESERVED.contains(&name.as_str()) {
        return format!("{name}_");
    }
    if KEYWORDS.contains(&name.as_str()) {
        return format!("r#{name}");
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pascal_case_splits_delimiters_and_humps() {
        assert_eq!(pascal_case("users_user_full"), "UsersUserFull");
        assert_eq!(pascal_case("users.get"), "UsersGet");
        assert_eq!(pascal_case("photoSizes"), "PhotoSizes");
        assert_eq!(pascal_case("HTTPServer"), "HttpServer");
        assert_eq!(pascal_case("photo_604"), "Photo604");
    }

    #[test]
    fn snake_case_lowercases_words() {
        assert_eq!(snake_case("extendedResponse"), "extended_response");
        assert_eq!(snake_case("photo_130"), "photo_130");
        assert_eq!(snake_case("first-name"), "first_name");
    }

    #[test]
    fn escapes_keywords_and_leading_digits() {
        let naming = Naming::default();
        assert_eq!(naming.field_name("type"), "r#type");
        assert_eq!(naming.field_name("self"), "self_");
        assert_eq!(naming.field_name("2fa"), "_2_fa");
        assert_eq!(naming.type_name("1"), "_1");
        assert_eq!(naming.const_name("max width"), "MAX_WIDTH");
    }

    #[test]
    fn rename_off_keeps_case() {
        let naming = Naming { rename: false };
        assert_eq!(naming.type_name("users_user"), "users_user");
        assert_eq!(naming.type_name("users.get"), "users_get");
        assert_eq!(naming.field_name("firstName"), "firstName");
    }
}
