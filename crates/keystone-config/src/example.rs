//! Example environment file rendering.

use crate::field::{DefaultValue, FieldDescriptor, FieldKind};
use crate::Schema;

/// Render a `.env.example` documenting every key of `schema`.
///
/// Required keys are written active. Every other key is commented out, showing
/// its default or, failing that, an illustrative value. Required keys keep
/// their placeholder, so a copied example does not validate until edited.
///
/// ```
/// use keystone_config::{render_env_example, Schema};
///
/// let example = render_env_example(&Schema::standard());
/// assert!(example.contains("PORT=3000"));
/// assert!(example.contains("# DATABASE_URL="));
/// ```
pub fn render_env_example(schema: &Schema) -> String {
    let mut out = String::new();

    for (index, section) in schema.sections().iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("# --- {} ---\n", section.name));
        for field in &section.fields {
            render_field(&mut out, field);
        }
    }

    out
}

fn render_field(out: &mut String, field: &FieldDescriptor) {
    let mut comment = field.description.to_string();
    if let FieldKind::Enum(allowed) = field.kind {
        comment.push_str(&format!(" [{}]", allowed.join("|")));
    }
    if field.is_required() {
        comment.push_str(" (required)");
    }
    if !comment.trim().is_empty() {
        out.push_str(&format!("# {}\n", comment.trim()));
    }

    let value = match field.default {
        DefaultValue::Integer(value) => value.to_string(),
        DefaultValue::Boolean(value) => value.to_string(),
        DefaultValue::Str(value) => value.to_string(),
        DefaultValue::Required | DefaultValue::Unset => {
            field.example.unwrap_or_default().to_string()
        }
    };

    let prefix = if field.is_required() { "" } else { "# " };
    out.push_str(&format!("{prefix}{}={value}\n", field.key));
}
