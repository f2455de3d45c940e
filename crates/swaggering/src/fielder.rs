//! The field accessor contract.
//!
//! [`Fielder`] gives the population engine a uniform way to read, write and
//! query a heterogeneously-typed struct by field name. It is implemented once,
//! for every type that describes itself through a [`Schema`]. The schema is
//! plain data (wire names, aliases and slot accessors) and is usually generated
//! with [`#[derive(Fielder)]`](derive@crate::Fielder).
use std::fmt::Debug;

use serde_json::{Map, Value};
use snafu::{OptionExt, ResultExt, Snafu};

use crate::{populate, presence::Presence, value::ValueError};

/// The error type for field accessor operations.
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum FieldError {
    /// The name doesn't match any declared field of the type.
    #[snafu(display("no such field {field:?} on {type_name}"))]
    UnknownField {
        field: String,
        type_name: &'static str,
    },

    /// The value doesn't match the declared type of the field. The presence of
    /// the field is left untouched.
    #[snafu(display("field {field:?} on {type_name} rejected the value: {source}"))]
    TypeMismatch {
        field: String,
        type_name: &'static str,
        source: ValueError,
    },

    /// The field is declared but not present, either because it was never set
    /// or because it was cleared. `state` echoes the object at the time of the
    /// call.
    #[snafu(display("field {field:?} is not set on {type_name} {state}"))]
    NotPresent {
        field: String,
        type_name: &'static str,
        state: String,
    },
}

/// Describes a single declared field of a DTO.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    aliases: &'static [&'static str],
}

impl FieldDescriptor {
    /// Creates a descriptor for the field with wire name `name`, which can
    /// additionally be addressed by any of `aliases`.
    pub const fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }

    /// The wire (JSON) name of the field. Presence is keyed by this name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn aliases(&self) -> &'static [&'static str] {
        self.aliases
    }

    /// Returns `true` if `candidate` is exactly the wire name or one of the
    /// aliases.
    pub fn matches(&self, candidate: &str) -> bool {
        self.name == candidate || self.aliases.contains(&candidate)
    }

    /// Like [`FieldDescriptor::matches`], but ignoring ASCII case.
    pub fn matches_ignore_case(&self, candidate: &str) -> bool {
        self.name.eq_ignore_ascii_case(candidate)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(candidate))
    }
}

/// The static description of a DTO type, plus access to its storage.
///
/// Fields are addressed by their index into [`Schema::FIELDS`]. Implementing
/// this trait is enough to get [`Fielder`] for free. Most types should use
/// [`#[derive(Fielder)]`](derive@crate::Fielder) instead of implementing it by
/// hand.
pub trait Schema: Debug {
    /// The name of the type, as reported in errors.
    const TYPE_NAME: &'static str;

    /// The declared fields, in declaration order.
    const FIELDS: &'static [FieldDescriptor];

    fn presence(&self) -> &Presence;

    fn presence_mut(&mut self) -> &mut Presence;

    /// Reads the field stored in slot `index`, regardless of its presence.
    fn read_slot(&self, index: usize) -> Option<Value>;

    /// Converts `value` to the declared type of slot `index` and stores it.
    /// Storage is left untouched if the conversion fails.
    fn write_slot(&mut self, index: usize, value: Value) -> Result<(), ValueError>;

    /// Resets the presence tracker and every declared field to their defaults.
    /// Fields outside the schema keep their values.
    fn reset(&mut self)
    where
        Self: Default + Sized,
    {
        *self = Self::default();
    }
}

/// Finds the declared field matching `name`.
///
/// Exact matches on the wire name or an alias win. Otherwise the first field
/// matching while ignoring ASCII case is returned.
pub fn lookup<T: Schema>(name: &str) -> Option<(usize, &'static FieldDescriptor)> {
    let fields = T::FIELDS;

    fields
        .iter()
        .position(|field| field.matches(name))
        .or_else(|| {
            fields
                .iter()
                .position(|field| field.matches_ignore_case(name))
        })
        .map(|index| (index, &fields[index]))
}

/// An object with optional fields.
///
/// Every operation accepts the canonical wire name of a field (often
/// `camelCase`) as well as its exported alias (`PascalCase`), so the same
/// accessors serve JSON-driven population and programmatic construction.
pub trait Fielder: Debug {
    /// Returns the names of all present fields, sorted.
    fn fields_present(&self) -> Vec<String>;

    /// Returns the value of the field `name`, failing if it is not present.
    fn get_field(&self, name: &str) -> Result<Value, FieldError>;

    /// Stores `value` in the field `name` and marks it as present.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError>;

    /// Marks the field `name` as not present. The stored value is kept.
    fn clear_field(&mut self, name: &str) -> Result<(), FieldError>;

    /// Sets every entry of `from`, stopping at the first error. Entries applied
    /// before the error stay applied.
    fn load_map(&mut self, from: Map<String, Value>) -> Result<(), FieldError>;
}

impl<T: Schema> Fielder for T {
    fn fields_present(&self) -> Vec<String> {
        self.presence().names()
    }

    fn get_field(&self, name: &str) -> Result<Value, FieldError> {
        let (index, field) = lookup::<T>(name).context(UnknownFieldSnafu {
            field: name,
            type_name: T::TYPE_NAME,
        })?;

        if !self.presence().is_present(field.name()) {
            return NotPresentSnafu {
                field: field.name(),
                type_name: T::TYPE_NAME,
                state: format!("{self:?}"),
            }
            .fail();
        }

        self.read_slot(index).context(UnknownFieldSnafu {
            field: name,
            type_name: T::TYPE_NAME,
        })
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        let (index, field) = lookup::<T>(name).context(UnknownFieldSnafu {
            field: name,
            type_name: T::TYPE_NAME,
        })?;

        self.write_slot(index, value).context(TypeMismatchSnafu {
            field: field.name(),
            type_name: T::TYPE_NAME,
        })?;
        self.presence_mut().mark(field.name());

        Ok(())
    }

    fn clear_field(&mut self, name: &str) -> Result<(), FieldError> {
        let (_, field) = lookup::<T>(name).context(UnknownFieldSnafu {
            field: name,
            type_name: T::TYPE_NAME,
        })?;

        self.presence_mut().clear(field.name());
        Ok(())
    }

    fn load_map(&mut self, from: Map<String, Value>) -> Result<(), FieldError> {
        populate::load_map_into_dto(from, self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::value::{FieldValue, JsonKind};

    // A hand-written schema, to exercise the contract without the derive macro
    #[derive(Debug, Default)]
    struct Endpoint {
        presence: Presence,
        value: String,
        port: i32,
        active: bool,
    }

    impl Schema for Endpoint {
        const FIELDS: &'static [FieldDescriptor] = &[
            FieldDescriptor::new("value", &["Value"]),
            FieldDescriptor::new("port", &["Port"]),
            FieldDescriptor::new("active", &["Active", "enabled"]),
        ];
        const TYPE_NAME: &'static str = "Endpoint";

        fn presence(&self) -> &Presence {
            &self.presence
        }

        fn presence_mut(&mut self) -> &mut Presence {
            &mut self.presence
        }

        fn read_slot(&self, index: usize) -> Option<Value> {
            match index {
                0 => Some(self.value.to_field_value()),
                1 => Some(self.port.to_field_value()),
                2 => Some(self.active.to_field_value()),
                _ => None,
            }
        }

        fn write_slot(&mut self, index: usize, value: Value) -> Result<(), ValueError> {
            match index {
                0 => self.value = FieldValue::from_field_value(value)?,
                1 => self.port = FieldValue::from_field_value(value)?,
                2 => self.active = FieldValue::from_field_value(value)?,
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

    #[test]
    fn fresh_object_has_nothing_present() {
        let endpoint = Endpoint::default();

        assert!(endpoint.fields_present().is_empty());
        for name in ["value", "port", "active"] {
            assert!(matches!(
                endpoint.get_field(name),
                Err(FieldError::NotPresent { .. })
            ));
        }
    }

    #[test]
    fn set_get_clear() {
        let mut endpoint = Endpoint::default();

        endpoint.set_field("port", json!(8080)).unwrap();
        assert_eq!(endpoint.get_field("port"), Ok(json!(8080)));
        assert_eq!(endpoint.port, 8080);

        endpoint.clear_field("port").unwrap();
        let err = endpoint.get_field("port").unwrap_err();
        assert!(matches!(err, FieldError::NotPresent { ref field, .. } if field == "port"));
        assert!(err.to_string().contains("port: 8080"));

        // The storage survives clearing
        assert_eq!(endpoint.port, 8080);
    }

    #[test]
    fn exported_alias_and_case_insensitive_names() {
        let mut endpoint = Endpoint::default();

        endpoint.set_field("Value", json!("abc123")).unwrap();
        endpoint.set_field("PORT", json!(443)).unwrap();
        endpoint.set_field("enabled", json!(true)).unwrap();

        assert_eq!(endpoint.fields_present(), vec!["active", "port", "value"]);
        assert_eq!(endpoint.get_field("value"), Ok(json!("abc123")));
        assert_eq!(endpoint.get_field("Active"), Ok(json!(true)));
    }

    #[test]
    fn type_mismatch_leaves_presence_unset() {
        let mut endpoint = Endpoint::default();

        let err = endpoint
            .set_field("port", json!("not-a-number"))
            .unwrap_err();
        assert_eq!(
            err,
            FieldError::TypeMismatch {
                field: "port".to_owned(),
                type_name: "Endpoint",
                source: ValueError::Mismatch {
                    value: json!("not-a-number"),
                    found: JsonKind::String,
                    expected: "int32".into(),
                },
            }
        );
        assert!(err.to_string().contains("port"));
        assert!(err.to_string().contains("not-a-number"));
        assert!(endpoint.fields_present().is_empty());
        assert_eq!(endpoint.port, 0);
    }

    #[test]
    fn unknown_field_names_the_type() {
        let mut endpoint = Endpoint::default();

        let err = endpoint.set_field("hostname", json!("web-1")).unwrap_err();
        assert_eq!(err.to_string(), r#"no such field "hostname" on Endpoint"#);
        assert!(endpoint.clear_field("hostname").is_err());
        assert!(endpoint.get_field("hostname").is_err());
    }

    #[test]
    fn load_map_stops_at_the_first_error() {
        let mut endpoint = Endpoint::default();
        let from = json!({"active": true, "port": "eighty", "value": "abc"});
        let Value::Object(from) = from else {
            unreachable!()
        };

        // Keys are applied in sorted order, so `active` lands before `port` fails
        assert!(endpoint.load_map(from).is_err());
        assert_eq!(endpoint.fields_present(), vec!["active"]);
    }
}
