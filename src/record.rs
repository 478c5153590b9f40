//! Record trait linking host application types to the dispatcher.

use crate::error::EventError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Trait implemented by every record type the host wants to watch.
///
/// The default payload is the record's full `Serialize` output, so the
/// declared fields and the serde fields must agree. Timestamps and unique
/// identifiers get their canonical renderings (ISO-8601, hyphenated string)
/// from chrono's and uuid's serde integration.
///
/// # Example
///
/// ```rust,ignore
/// use serde::Serialize;
/// use crud_events::Record;
///
/// #[derive(Debug, Serialize)]
/// pub struct Model1 {
///     pub id: i64,
///     pub int_field: i64,
///     pub char_field: String,
/// }
///
/// impl Record for Model1 {
///     const MODEL: &'static str = "app.Model1";
///     const FIELDS: &'static [&'static str] = &["id", "int_field", "char_field"];
///
///     fn record_id(&self) -> String {
///         self.id.to_string()
///     }
/// }
/// ```
pub trait Record: Serialize + Send + Sync + 'static {
    /// Fully qualified model name, `<app>.<Type>` form.
    ///
    /// The type part is converted to snake_case for the event base name
    /// unless the watch entry configures an explicit prefix.
    const MODEL: &'static str;

    /// Declared field names in declaration order.
    ///
    /// Used to validate a configured status field at load time.
    const FIELDS: &'static [&'static str];

    /// Primary key rendered as a string.
    ///
    /// This is the instance identity used for instance-scoped suppression.
    fn record_id(&self) -> String;
}

/// Serialize a record into its full field→value mapping, in declaration order.
///
/// This is the default payload transform; custom serializers can build on it.
pub fn snapshot<R: Record>(record: &R) -> Result<Map<String, Value>, EventError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(EventError::SerializationFailed {
            what: R::MODEL.to_string(),
            cause: format!("expected an object, got {other}"),
        }),
        Err(e) => Err(EventError::SerializationFailed {
            what: R::MODEL.to_string(),
            cause: e.to_string(),
        }),
    }
}

/// Read the current value of a named field off a record.
///
/// String values are taken as-is; other scalars render via their JSON form.
pub(crate) fn field_value<R: Record>(record: &R, field: &str) -> Result<String, EventError> {
    let snap = snapshot(record)?;
    match snap.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Ok(other.to_string()),
        None => Err(EventError::UnknownStatusField {
            model: R::MODEL.to_string(),
            field: field.to_string(),
        }),
    }
}
