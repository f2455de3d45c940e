//! Rendering DTOs as JSON and text, honoring presence.
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use snafu::{ResultExt, Snafu};

use crate::{dto::Dto, fielder::Fielder};

const UNFORMATTABLE: &str = "<unformattable>";

/// The error type for marshalling operations.
#[derive(Debug, Snafu)]
pub enum FormatError {
    #[snafu(display("failed to serialize DTO as JSON"))]
    SerializeJson { source: serde_json::Error },
}

/// Collects the present fields of `dto` into a JSON object.
///
/// Fields that are not present are omitted entirely, so the result mirrors how
/// the object was populated rather than its full declared shape.
pub fn to_json_map<F>(dto: &F) -> Map<String, Value>
where
    F: Fielder + ?Sized,
{
    dto.fields_present()
        .into_iter()
        .filter_map(|name| {
            let value = dto.get_field(&name).ok()?;
            Some((name, value))
        })
        .collect()
}

/// Like [`to_json_map`], wrapped in a [`Value`].
pub fn marshal_value<F>(dto: &F) -> Value
where
    F: Fielder + ?Sized,
{
    Value::Object(to_json_map(dto))
}

/// Marshals a DTO (or list of DTOs) to JSON, omitting fields that aren't
/// present.
pub fn marshal_json<D>(dto: &D) -> Result<Vec<u8>, FormatError>
where
    D: Dto + ?Sized,
{
    serde_json::to_vec(&dto.marshal_value()).context(SerializeJsonSnafu)
}

/// Formats a DTO (or list of DTOs) as indented JSON, for logging and
/// debugging.
pub fn format_json<D>(dto: &D) -> String
where
    D: Dto + ?Sized,
{
    serde_json::to_string_pretty(&dto.marshal_value()).unwrap_or_else(|_| UNFORMATTABLE.to_owned())
}

/// Formats the present fields of a DTO as a human-readable key/value dump,
/// for example `SingularityTaskId { instanceNo: 1, requestId: "web" }`.
pub fn format_text<F>(type_name: &str, dto: &F) -> String
where
    F: Fielder + ?Sized,
{
    let fields = to_json_map(dto)
        .into_iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>();

    if fields.is_empty() {
        format!("{type_name} {{}}")
    } else {
        format!("{type_name} {{ {} }}", fields.join(", "))
    }
}

/// Serializes a DTO through serde using its presence-aware JSON form.
///
/// Derived DTOs and lists implement [`Serialize`] with this function, so they
/// can be embedded in request bodies encoded by any serde serializer.
pub fn serialize_dto<D, S>(dto: &D, serializer: S) -> Result<S::Ok, S::Error>
where
    D: Dto + ?Sized,
    S: Serializer,
{
    dto.marshal_value().serialize(serializer)
}
