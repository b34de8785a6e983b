// src/recipe/template.rs

//! Template rendering for self-referential recipe fields
//!
//! Supports `{{.Field}}` interpolation, where `Field` is one of the
//! recipe's public scalar fields by exported name (`{{.Version}}`,
//! `{{.Home}}`, ...). Referencing a field that does not exist is an
//! error, not a silent empty string; a typo in a recipe should never
//! produce a half-rendered URL.

/// Render one template string against a field lookup.
///
/// Returns the rendered text, or an error message citing the template
/// position (line:column) and the offending field or action.
pub(crate) fn render<F>(input: &str, lookup: &F) -> Result<String, String>
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(input.len());
    let mut rest = input;
    let mut offset = 0;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let action_offset = offset + start;

        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or_else(|| format!("template: {}: unclosed action", position(input, action_offset)))?;

        let action = after_open[..end].trim();
        let field = action.strip_prefix('.').ok_or_else(|| {
            format!(
                "template: {}: unexpected {:?} in command",
                position(input, action_offset),
                action
            )
        })?;

        if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(format!(
                "template: {}: bad character in field name {:?}",
                position(input, action_offset),
                field
            ));
        }

        let value = lookup(field).ok_or_else(|| {
            format!(
                "template: {}: can't evaluate field {} in recipe",
                position(input, action_offset),
                field
            )
        })?;
        output.push_str(&value);

        let consumed = start + 2 + end + 2;
        offset += consumed;
        rest = &rest[consumed..];
    }

    output.push_str(rest);
    Ok(output)
}

/// 1-based line:column of a byte offset, Go-template style
fn position(input: &str, offset: usize) -> String {
    let mut line = 1;
    let mut col = 1;
    for c in input[..offset].chars() {
        if c == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    format!("{}:{}", line, col)
}
