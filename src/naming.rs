//! Event name derivation.

use crate::event::Action;

/// Convert the type part of a `<app>.<Type>` model name to snake_case.
///
/// An underscore is inserted before every interior uppercase letter, so
/// `StatusModel2` becomes `status_model2`.
pub(crate) fn slug_model_name(model: &str) -> String {
    let type_name = model.rsplit('.').next().unwrap_or(model);
    let mut slug = String::with_capacity(type_name.len() + 4);
    for (i, ch) in type_name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                slug.push('_');
            }
            slug.push(ch.to_ascii_lowercase());
        } else {
            slug.push(ch);
        }
    }
    slug
}

/// Derive the outbound event name.
///
/// Deletes always map to `__deleted`. Otherwise a configured status value
/// takes precedence over the create/update distinction.
pub(crate) fn event_name(base: &str, action: Action, status: Option<&str>) -> String {
    match (action, status) {
        (Action::Deleted, _) => format!("{base}__deleted"),
        (_, Some(status)) => format!("{base}__{status}"),
        (action, None) => format!("{base}__{}", action.suffix()),
    }
}
