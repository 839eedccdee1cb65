//! Text substitution for preset identifiers and copyright notices.
//!
//! Preset folder, name, and slug values may contain tokens of the form
//! `{variable_id | filter1 | filter2}`, resolved against previously loaded
//! variable data and passed through a small fixed registry of named filters.
//! Copyright text uses plain `{key}` placeholders resolved from the
//! copyright mapping.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::constants::VARIABLE_ID_TEMPLATE_PATTERN;
use crate::core::ConfigurationError;
use crate::variable::DataById;

static TEMPLATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(VARIABLE_ID_TEMPLATE_PATTERN).expect("template pattern"));
static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\}").expect("key pattern"));

/// Substitute `{variable_id | filter}` tokens using loaded variable data.
///
/// Text without tokens, or an empty data mapping, passes through unchanged.
/// A token naming an absent variable fails with the offending id attached;
/// an unknown filter name fails outright.
pub fn format_text(text: &str, data_by_id: &DataById) -> Result<String, ConfigurationError> {
    if data_by_id.is_empty() {
        return Ok(text.to_string());
    }
    let mut formatted = String::with_capacity(text.len());
    let mut tail = 0;
    for captures in TEMPLATE_PATTERN.captures_iter(text) {
        let token = captures.get(0).expect("whole match");
        let inner_text = &captures[1];
        let mut terms = inner_text.split('|');
        let variable_id = terms.next().expect("split yields at least one term").trim();
        let variable_data = data_by_id.get(variable_id).ok_or_else(|| {
            ConfigurationError::new(format!("preset \"{text}\" is missing a value"))
                .with_variable_id(variable_id)
        })?;
        let mut value = match &variable_data.value {
            Some(value) => render_value(value),
            None => String::new(),
        };
        for filter_name in terms {
            let filter_name = filter_name.trim();
            if filter_name.is_empty() {
                continue;
            }
            value = match filter_name {
                "slug" => format_slug(&value),
                "title" => format_title(&value),
                _ => {
                    return Err(ConfigurationError::new(format!(
                        "function \"{filter_name}\" is not supported in \"{inner_text}\""
                    )));
                }
            };
        }
        formatted.push_str(&text[tail..token.start()]);
        formatted.push_str(&value);
        tail = token.end();
    }
    formatted.push_str(&text[tail..]);
    Ok(formatted)
}

/// Substitute `{key}` placeholders in copyright text from the copyright
/// mapping; an undefined key is a configuration error.
pub fn format_copyright_text(
    text: &str,
    value_by_key: &serde_yaml::Mapping,
) -> Result<String, ConfigurationError> {
    let mut formatted = String::with_capacity(text.len());
    let mut tail = 0;
    for captures in KEY_PATTERN.captures_iter(text) {
        let token = captures.get(0).expect("whole match");
        let key = &captures[1];
        let value = value_by_key
            .get(key)
            .and_then(render_yaml_value)
            .ok_or_else(|| {
                ConfigurationError::new(format!(
                    "copyright \"{key}\" is specified in text but undefined"
                ))
            })?;
        formatted.push_str(&text[tail..token.start()]);
        formatted.push_str(&value);
        tail = token.end();
    }
    formatted.push_str(&text[tail..]);
    Ok(formatted)
}

/// Render a loaded value as display text; strings lose their quotes.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn render_yaml_value(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Lowercase text with runs of non-alphanumerics collapsed into hyphens.
pub fn format_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for character in text.chars() {
        if character.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(character.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Title-case each whitespace-separated word.
pub fn format_title(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut characters = word.chars();
            match characters.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>()
                        + &characters.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Derive a human label from a variable id.
pub fn format_name(variable_id: &str) -> String {
    let text = variable_id.replace('_', " ");
    let text = text.trim();
    let mut characters = text.chars();
    match characters.next() {
        Some(first) => first.to_uppercase().collect::<String>() + characters.as_str(),
        None => String::new(),
    }
}
