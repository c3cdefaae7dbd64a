//! Command-template placeholders.
//!
//! Templates use `{name}` placeholders, `{{` and `}}` for literal braces.
//! Anything after a `:` or `!` inside a placeholder (a format spec or
//! conversion) is ignored when naming the placeholder.

use thiserror::Error;

/// The reserved placeholder filled with the query target.
pub const TARGET: &str = "target";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unclosed '{{' in command template '{template}'")]
    Unclosed { template: String },

    #[error("single '}}' encountered in command template '{template}'")]
    UnmatchedClose { template: String },

    #[error("invalid placeholder '{{{placeholder}}}' in command template '{template}'")]
    InvalidPlaceholder { template: String, placeholder: String },

    #[error("no value for placeholder '{name}' in command template '{template}'")]
    MissingValue { template: String, name: String },
}

enum Segment<'a> {
    Text(&'a str),
    Field(&'a str),
}

fn segments(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let bytes = template.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' if bytes.get(i + 1) == Some(&b'{') => {
                // Keep one brace of the escaped pair.
                out.push(Segment::Text(&template[start..=i]));
                i += 2;
                start = i;
            }
            b'{' => {
                out.push(Segment::Text(&template[start..i]));
                let close = template[i + 1..]
                    .find('}')
                    .ok_or_else(|| TemplateError::Unclosed {
                        template: template.to_string(),
                    })?;
                let inner = &template[i + 1..i + 1 + close];
                let name = inner.split([':', '!']).next().unwrap_or_default();
                if !is_identifier(name) {
                    return Err(TemplateError::InvalidPlaceholder {
                        template: template.to_string(),
                        placeholder: inner.to_string(),
                    });
                }
                out.push(Segment::Field(name));
                i += close + 2;
                start = i;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => {
                out.push(Segment::Text(&template[start..=i]));
                i += 2;
                start = i;
            }
            b'}' => {
                return Err(TemplateError::UnmatchedClose {
                    template: template.to_string(),
                })
            }
            _ => i += 1,
        }
    }
    out.push(Segment::Text(&template[start..]));
    Ok(out)
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Distinct placeholder names referenced by `template`, in first-use order.
pub fn placeholders(template: &str) -> Result<Vec<&str>, TemplateError> {
    let mut names: Vec<&str> = Vec::new();
    for segment in segments(template)? {
        if let Segment::Field(name) = segment {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    Ok(names)
}

/// Substitute every placeholder using `lookup`.
pub fn render<'v, F>(template: &str, lookup: F) -> Result<String, TemplateError>
where
    F: Fn(&str) -> Option<&'v str>,
{
    let mut out = String::with_capacity(template.len() + 16);
    for segment in segments(template)? {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Field(name) => {
                let value = lookup(name).ok_or_else(|| TemplateError::MissingValue {
                    template: template.to_string(),
                    name: name.to_string(),
                })?;
                out.push_str(value);
            }
        }
    }
    Ok(out)
}
