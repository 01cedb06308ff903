//! Identifier case conversion shared by expressions and template helpers.
//!
//! | Input            | snake              | kebab              | Pascal           | camel            |
//! |------------------|--------------------|--------------------|------------------|------------------|
//! | `My Awesome App` | `my_awesome_app`   | `my-awesome-app`   | `MyAwesomeApp`   | `myAwesomeApp`   |
//! | `HTTPRequest`    | `http_request`     | `http-request`     | `HttpRequest`    | `httpRequest`    |

/// Convert a string to `snake_case`.
pub fn to_snake_case(s: &str) -> String {
    split_words(s).join("_")
}

/// Convert a string to `kebab-case`.
pub fn to_kebab_case(s: &str) -> String {
    split_words(s).join("-")
}

/// Convert a string to `PascalCase`.
pub fn to_pascal_case(s: &str) -> String {
    split_words(s).iter().map(|w| capitalize(w)).collect()
}

/// Convert a string to `camelCase`.
pub fn to_camel_case(s: &str) -> String {
    split_words(s)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.clone() } else { capitalize(w) })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = String::with_capacity(word.len());
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
            out
        }
        None => String::new(),
    }
}

/// Split on separators (`_`, `-`, `.`, whitespace), on lower→upper
/// transitions (`myApp`) and on acronym boundaries (`HTTPServer`).
/// Words are lowercased.
fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' || c == '-' || c == '.' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(current.to_lowercase());
                current.clear();
            }
            continue;
        }

        if let Some(&next) = chars.peek() {
            if (c.is_lowercase() || c.is_ascii_digit()) && next.is_uppercase() {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }

            // "HTTPServer": split before the last capital of the acronym.
            if c.is_uppercase()
                && next.is_uppercase()
                && chars.clone().nth(1).is_some_and(|n| n.is_lowercase())
            {
                current.push(c);
                words.push(current.to_lowercase());
                current.clear();
                continue;
            }
        }

        current.push(c);
    }

    if !current.is_empty() {
        words.push(current.to_lowercase());
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_case_variants() {
        assert_eq!(to_snake_case("MyApp"), "my_app");
        assert_eq!(to_snake_case("my-app"), "my_app");
        assert_eq!(to_snake_case("XMLHttpRequest"), "xml_http_request");
        assert_eq!(to_snake_case("my awesome project"), "my_awesome_project");
    }

    #[test]
    fn kebab_case_variants() {
        assert_eq!(to_kebab_case("MyAwesomeApp"), "my-awesome-app");
        assert_eq!(to_kebab_case("org.acme.tools"), "org-acme-tools");
    }

    #[test]
    fn pascal_and_camel() {
        assert_eq!(to_pascal_case("my-app"), "MyApp");
        assert_eq!(to_pascal_case("HTTPRequest"), "HttpRequest");
        assert_eq!(to_camel_case("my_app name"), "myAppName");
        assert_eq!(to_camel_case(""), "");
    }
}
