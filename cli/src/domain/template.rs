//! Service descriptor rendering.
//!
//! A descriptor is produced from a template in three stages: the four fixed
//! placeholders are replaced literally, then every `@NAME@` macro supplied by
//! providers or the caller is replaced in a single left-to-right pass, and
//! finally line endings are normalized to CRLF. Rendering fails if any
//! required macro is still present afterwards.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::error::TemplateError;

pub const ID: &str = "ID";
pub const JAVA: &str = "JAVA";
pub const VMARGS: &str = "VMARGS";
pub const ARGS: &str = "ARGS";

/// Placeholders every template carries.
pub const FIXED_MACROS: [&str; 4] = [ID, JAVA, VMARGS, ARGS];

/// A named contributor of macro values.
///
/// `values` must not fail: a provider whose inputs are unavailable returns
/// its own inert value instead.
pub trait MacroProvider {
    /// Macro names this provider can satisfy.
    fn macro_names(&self) -> Vec<String>;

    /// Fallback used when [`values`](Self::values) has no entry for `name`.
    fn default_value(&self, name: &str) -> Option<String>;

    /// Computed values, keyed by macro name.
    fn values(&self) -> BTreeMap<String, String>;
}

/// Inputs of one render call.
#[derive(Debug, Clone, Default)]
pub struct DescriptorRequest {
    pub service_id: String,
    pub java: String,
    pub vm_args: Option<String>,
    /// Program arguments, already quoted.
    pub args: String,
    /// Caller-supplied macros; these win over provider values.
    pub explicit: BTreeMap<String, String>,
}

/// Renders `template` for `request`.
///
/// Providers are consulted in order; when two declare the same name the
/// later one wins, and explicit macros win over both.
///
/// # Errors
///
/// Returns [`TemplateError::UnresolvedMacros`] naming, in sorted order, every
/// required macro left in the output.
pub fn render(
    template: &str,
    request: &DescriptorRequest,
    providers: &[&dyn MacroProvider],
) -> Result<String, TemplateError> {
    let text = template
        .replace("@ID@", &request.service_id)
        .replace("@JAVA@", &request.java)
        .replace("@VMARGS@", request.vm_args.as_deref().unwrap_or_default())
        .replace("@ARGS@", &request.args);

    let macros = resolve_macros(providers, &request.explicit);

    let mut required: BTreeSet<String> = FIXED_MACROS.iter().map(ToString::to_string).collect();
    required.extend(providers.iter().flat_map(|p| p.macro_names()));
    required.extend(macros.keys().cloned());
    for value in macros.values() {
        required.extend(macro_tokens(value).map(str::to_string));
    }

    let text = normalize_line_endings(&substitute(&text, &macros));

    let unresolved: BTreeSet<&str> = macro_tokens(&text)
        .filter(|name| required.contains(*name))
        .collect();
    if !unresolved.is_empty() {
        return Err(TemplateError::UnresolvedMacros {
            names: unresolved.into_iter().map(str::to_string).collect(),
        });
    }
    Ok(text)
}

/// Defaults, then provider values, then explicit macros.
fn resolve_macros(
    providers: &[&dyn MacroProvider],
    explicit: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut macros = BTreeMap::new();
    for provider in providers {
        for name in provider.macro_names() {
            if let Some(default) = provider.default_value(&name) {
                macros.insert(name, default);
            }
        }
    }
    for provider in providers {
        macros.extend(provider.values());
    }
    macros.extend(explicit.iter().map(|(k, v)| (k.clone(), v.clone())));
    macros
}

/// Replaces each `@NAME@` found in `text` with its value. Inserted values are
/// never rescanned.
fn substitute(text: &str, macros: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut cursor = 0;
    while let Some((start, end)) = next_token(text, cursor) {
        let name = &text[start + 1..end - 1];
        if let Some(value) = macros.get(name) {
            out.push_str(&text[copied..start]);
            out.push_str(value);
            copied = end;
            cursor = end;
        } else {
            // The closing '@' may open the next token.
            cursor = end - 1;
        }
    }
    out.push_str(&text[copied..]);
    out
}

/// Names of all `@NAME@` tokens in `text`, in order of appearance.
pub fn macro_tokens(text: &str) -> impl Iterator<Item = &str> {
    let mut cursor = 0;
    std::iter::from_fn(move || {
        let (start, end) = next_token(text, cursor)?;
        cursor = end - 1;
        Some(&text[start + 1..end - 1])
    })
}

/// Byte range of the next `@NAME@` token at or after `from`, where `NAME` is
/// one or more of `A-Z`, `0-9`, `_`.
fn next_token(text: &str, from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut i = from;
    while let Some(offset) = text.get(i..)?.find('@') {
        let start = i + offset;
        let name_len = bytes[start + 1..]
            .iter()
            .take_while(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || **b == b'_')
            .count();
        let close = start + 1 + name_len;
        if name_len > 0 && bytes.get(close) == Some(&b'@') {
            return Some((start, close + 1));
        }
        i = start + 1;
    }
    None
}

/// Converts every line ending to CRLF without doubling existing ones.
#[must_use]
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

// ── Unit tests ───────────────────────────────────────────────────────────────
