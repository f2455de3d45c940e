//! Generic population and presence tracking for REST data transfer objects.
//!
//! DTOs declare their fields once with [`#[derive(Fielder)]`](derive@Fielder)
//! and get name-based field access ([`Fielder`]), JSON population
//! ([`read_populate`]), presence-aware marshalling ([`Dto::marshal_json`]),
//! human-readable formatting and same-type absorption ([`Dto::absorb`]).
//!
//! Presence is tracked per field: a field is present once it was set (by
//! population or by [`Fielder::set_field`]) and until it is cleared. Only
//! present fields are marshalled.
//!
//! ```
//! use std::io::Cursor;
//!
//! use swaggering::{Dto, Fielder, Presence};
//!
//! #[derive(Clone, Debug, Default, Fielder)]
//! struct Endpoint {
//!     #[fielder(presence)]
//!     presence: Presence,
//!     value: String,
//!     port: i32,
//!     active: bool,
//! }
//!
//! let mut endpoint = Endpoint::default();
//! endpoint
//!     .populate(&mut Cursor::new(r#"{"value": "abc123", "port": 8080}"#))
//!     .unwrap();
//!
//! assert_eq!(endpoint.fields_present(), vec!["port", "value"]);
//! assert_eq!(endpoint.get_field("port").unwrap(), 8080);
//! assert!(endpoint.get_field("active").is_err());
//! ```

pub mod dto;
pub mod fielder;
pub mod format;
pub mod list;
pub mod populate;
pub mod presence;
pub mod value;

// External re-exports
pub use serde_json::{Map, Value};
// Internal re-exports
pub use swaggering_derive::{FieldEnum, Fielder};

pub use crate::{
    dto::{AbsorbError, Dto},
    fielder::{FieldDescriptor, FieldError, Fielder, Schema},
    format::{FormatError, format_json, format_text, marshal_json},
    list::{DtoList, StringList},
    populate::{
        PopulateError, PopulateOptions, UnknownFields, load_map_into_dto, read_populate,
        read_populate_with,
    },
    presence::{Presence, presence_from_map},
    value::{ByteString, FieldValue, JsonKind, MapKey, ValueError},
};

#[doc(hidden)]
pub mod __private {
    pub use serde;
}
