//! Populating DTOs from JSON byte streams and already-decoded maps.
use std::{borrow::Cow, io::Read};

use serde_json::{Map, Value};
use snafu::{ResultExt, Snafu};
use tracing::{debug, trace};

use crate::{
    dto::Dto,
    fielder::{FieldError, Fielder, Schema},
    value::{JsonKind, ValueError},
};

/// The error type for population operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PopulateError {
    #[snafu(display("failed to read JSON body"))]
    ReadStream { source: std::io::Error },

    #[snafu(display("failed to parse JSON body"))]
    ParseJson { source: serde_json::Error },

    /// The top-level JSON value doesn't match the kind of destination, for
    /// example an array was received for a single DTO.
    #[snafu(display("expected a JSON {expected} to populate {type_name}, found {found}"))]
    UnexpectedShape {
        expected: JsonKind,
        found: JsonKind,
        type_name: &'static str,
    },

    #[snafu(display("failed to populate {type_name}"))]
    PopulateField {
        type_name: &'static str,
        source: FieldError,
    },

    #[snafu(display("failed to convert JSON value into {type_name}"))]
    ConvertValue {
        type_name: &'static str,
        source: ValueError,
    },

    #[snafu(display("failed to populate list element {index}"))]
    PopulateElement {
        index: usize,
        source: Box<PopulateError>,
    },
}

/// What to do with JSON keys that don't match any declared field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UnknownFields {
    /// Skip them. Newer servers may send fields older clients don't know about.
    #[default]
    Ignore,

    /// Fail with [`FieldError::UnknownField`].
    Reject,
}

/// Provides configurable options during population.
///
/// The default options ignore unknown fields, which is what
/// [`read_populate`] uses. [`load_map_into_dto`] uses
/// [`PopulateOptions::strict`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PopulateOptions {
    pub unknown_fields: UnknownFields,
}

impl PopulateOptions {
    /// Options rejecting unknown fields.
    pub fn strict() -> Self {
        Self {
            unknown_fields: UnknownFields::Reject,
        }
    }
}

/// Reads all of `reader` and populates `destination` from the JSON it
/// contains, ignoring unknown fields.
///
/// Single DTOs expect a JSON object, lists expect a JSON array. An empty body
/// (or one containing only whitespace) populates nothing. Read errors are
/// returned as-is and never retried.
pub fn read_populate<R, D>(reader: R, destination: &mut D) -> Result<(), PopulateError>
where
    R: Read,
    D: Dto + ?Sized,
{
    read_populate_with(reader, destination, &PopulateOptions::default())
}

/// Like [`read_populate`], but with explicit [`PopulateOptions`].
pub fn read_populate_with<R, D>(
    mut reader: R,
    destination: &mut D,
    options: &PopulateOptions,
) -> Result<(), PopulateError>
where
    R: Read,
    D: Dto + ?Sized,
{
    let mut body = Vec::new();
    reader.read_to_end(&mut body).context(ReadStreamSnafu)?;

    debug!(
        bytes = body.len(),
        destination = destination.dto_type_name(),
        "populating DTO from JSON body"
    );

    if body.trim_ascii().is_empty() {
        return Ok(());
    }

    let value: Value = serde_json::from_slice(&body).context(ParseJsonSnafu)?;
    destination.populate_value(value, options)
}

/// Loads a map of key/values into a DTO, marking each field present as it is
/// loaded. Unknown keys are rejected.
///
/// Stops at the first failing entry; entries applied before it stay applied.
pub fn load_map_into_dto<F>(from: Map<String, Value>, destination: &mut F) -> Result<(), FieldError>
where
    F: Fielder + ?Sized,
{
    load_map_into_dto_with(from, destination, &PopulateOptions::strict())
}

/// Like [`load_map_into_dto`], but with explicit [`PopulateOptions`].
pub fn load_map_into_dto_with<F>(
    from: Map<String, Value>,
    destination: &mut F,
    options: &PopulateOptions,
) -> Result<(), FieldError>
where
    F: Fielder + ?Sized,
{
    for (name, value) in from {
        match destination.set_field(&name, value) {
            Ok(()) => {}
            Err(FieldError::UnknownField { type_name, .. })
                if options.unknown_fields == UnknownFields::Ignore =>
            {
                trace!(field = %name, type_name, "ignoring undeclared field");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

/// Resets the declared fields of `destination` and populates them from the
/// JSON object `value`. JSON `null` leaves `destination` untouched.
///
/// This is the single-object half of [`Dto::populate_value`].
pub fn populate_object<T>(
    destination: &mut T,
    value: Value,
    options: &PopulateOptions,
) -> Result<(), PopulateError>
where
    T: Schema + Default,
{
    match value {
        Value::Null => Ok(()),
        Value::Object(entries) => {
            destination.reset();
            load_map_into_dto_with(entries, destination, options).context(PopulateFieldSnafu {
                type_name: T::TYPE_NAME,
            })
        }
        other => UnexpectedShapeSnafu {
            expected: JsonKind::Object,
            found: JsonKind::from(&other),
            type_name: T::TYPE_NAME,
        }
        .fail(),
    }
}

/// Builds a DTO from a nested JSON object, ignoring unknown fields.
///
/// Used by the [`FieldValue`](crate::FieldValue) implementation of derived
/// DTOs, so that DTOs nest inside each other.
pub fn dto_from_value<T>(value: Value) -> Result<T, ValueError>
where
    T: Schema + Default,
{
    match value {
        Value::Object(entries) => {
            let mut dto = T::default();
            load_map_into_dto_with(entries, &mut dto, &PopulateOptions::default()).map_err(
                |source| ValueError::Nested {
                    type_name: T::TYPE_NAME,
                    source: Box::new(source),
                },
            )?;
            Ok(dto)
        }
        other => Err(ValueError::Mismatch {
            found: JsonKind::from(&other),
            value: other,
            expected: Cow::Borrowed(T::TYPE_NAME),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Cursor};

    use indoc::indoc;
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::{
        fielder::FieldDescriptor,
        presence::Presence,
        value::FieldValue,
    };

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    struct TaskId {
        presence: Presence,
        request_id: String,
        instance_no: i32,
    }

    impl Schema for TaskId {
        const FIELDS: &'static [FieldDescriptor] = &[
            FieldDescriptor::new("requestId", &["RequestId"]),
            FieldDescriptor::new("instanceNo", &["InstanceNo"]),
        ];
        const TYPE_NAME: &'static str = "TaskId";

        fn presence(&self) -> &Presence {
            &self.presence
        }

        fn presence_mut(&mut self) -> &mut Presence {
            &mut self.presence
        }

        fn read_slot(&self, index: usize) -> Option<Value> {
            match index {
                0 => Some(self.request_id.to_field_value()),
                1 => Some(self.instance_no.to_field_value()),
                _ => None,
            }
        }

        fn write_slot(&mut self, index: usize, value: Value) -> Result<(), ValueError> {
            match index {
                0 => self.request_id = FieldValue::from_field_value(value)?,
                1 => self.instance_no = FieldValue::from_field_value(value)?,
                _ => {
                    return Err(ValueError::NoSuchSlot {
                        type_name: Self::TYPE_NAME,
                        index,
                    });
                }
            }
            Ok(())
        }
    }

    impl Dto for TaskId {
        fn dto_type_name(&self) -> &'static str {
            Self::TYPE_NAME
        }

        fn populate_value(
            &mut self,
            value: Value,
            options: &PopulateOptions,
        ) -> Result<(), PopulateError> {
            populate_object(self, value, options)
        }

        fn marshal_value(&self) -> Value {
            crate::format::marshal_value(self)
        }

        fn absorb(&mut self, other: &dyn Dto) -> Result<(), crate::dto::AbsorbError> {
            crate::dto::absorb_from(self, other)
        }

        fn format_text(&self) -> String {
            crate::format::format_text(Self::TYPE_NAME, self)
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
        }
    }

    #[test]
    fn populates_declared_fields_and_ignores_the_rest() {
        let body = indoc! {r#"
            {
              "requestId": "web",
              "instanceNo": 3,
              "sanitizedHost": "ip-10-0-0-1"
            }
        "#};

        let mut task_id = TaskId::default();
        read_populate(Cursor::new(body), &mut task_id).unwrap();

        assert_eq!(task_id.request_id, "web");
        assert_eq!(task_id.instance_no, 3);
        assert_eq!(task_id.fields_present(), vec!["instanceNo", "requestId"]);
    }

    #[test]
    fn strict_options_reject_unknown_fields() {
        let body = r#"{"requestId": "web", "sanitizedHost": "ip-10-0-0-1"}"#;

        let mut task_id = TaskId::default();
        let err = read_populate_with(Cursor::new(body), &mut task_id, &PopulateOptions::strict())
            .unwrap_err();

        assert!(matches!(
            err,
            PopulateError::PopulateField {
                source: FieldError::UnknownField { .. },
                ..
            }
        ));
    }

    #[rstest]
    #[case("")]
    #[case("   \n\t")]
    #[case("null")]
    fn empty_bodies_populate_nothing(#[case] body: &str) {
        let mut task_id = TaskId::default();
        read_populate(Cursor::new(body), &mut task_id).unwrap();
        assert!(task_id.fields_present().is_empty());
    }

    #[rstest]
    #[case(r#"{"requestId": "web""#)]
    #[case("not json at all")]
    fn malformed_json_is_rejected(#[case] body: &str) {
        let mut task_id = TaskId::default();
        let err = read_populate(Cursor::new(body), &mut task_id).unwrap_err();
        assert!(matches!(err, PopulateError::ParseJson { .. }));
    }

    #[test]
    fn arrays_do_not_populate_single_dtos() {
        let mut task_id = TaskId::default();
        let err = read_populate(Cursor::new("[]"), &mut task_id).unwrap_err();

        assert!(matches!(
            err,
            PopulateError::UnexpectedShape {
                expected: JsonKind::Object,
                found: JsonKind::Array,
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "expected a JSON object to populate TaskId, found array"
        );
    }

    #[test]
    fn read_errors_are_propagated() {
        let mut task_id = TaskId::default();
        let err = read_populate(FailingReader, &mut task_id).unwrap_err();
        assert!(matches!(err, PopulateError::ReadStream { .. }));
    }

    #[test]
    fn type_mismatch_is_propagated() {
        let mut task_id = TaskId::default();
        let err = read_populate(Cursor::new(r#"{"instanceNo": "three"}"#), &mut task_id)
            .unwrap_err();

        assert!(matches!(
            err,
            PopulateError::PopulateField {
                source: FieldError::TypeMismatch { ref field, .. },
                ..
            } if field == "instanceNo"
        ));
    }

    #[test]
    fn repopulating_starts_from_scratch() {
        let mut task_id = TaskId::default();
        read_populate(Cursor::new(r#"{"requestId": "web"}"#), &mut task_id).unwrap();
        read_populate(Cursor::new(r#"{"instanceNo": 1}"#), &mut task_id).unwrap();

        assert_eq!(task_id.fields_present(), vec!["instanceNo"]);
        assert_eq!(task_id.request_id, "");
    }

    #[test]
    fn load_map_into_dto_rejects_unknown_fields() {
        let Value::Object(from) = json!({"requestId": "web", "rackId": "r1"}) else {
            unreachable!()
        };

        let mut task_id = TaskId::default();
        let err = load_map_into_dto(from, &mut task_id).unwrap_err();

        assert!(matches!(err, FieldError::UnknownField { ref field, .. } if field == "rackId"));
    }

    #[test]
    fn load_map_into_dto_through_a_trait_object() {
        let Value::Object(from) = json!({"RequestId": "web", "instanceNo": 7}) else {
            unreachable!()
        };

        let mut task_id = TaskId::default();
        let fielder: &mut dyn Fielder = &mut task_id;
        load_map_into_dto(from, fielder).unwrap();

        assert_eq!(task_id.request_id, "web");
        assert_eq!(task_id.instance_no, 7);
    }

    #[test]
    fn nested_values_require_objects() {
        let err = dto_from_value::<TaskId>(json!("web-3")).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"value "web-3" (string) couldn't be cast to type TaskId"#
        );

        let err = dto_from_value::<TaskId>(json!({"instanceNo": false})).unwrap_err();
        assert!(matches!(err, ValueError::Nested { type_name: "TaskId", .. }));
    }
}
