//! # udtcraft
//!
//! A codec for the in-memory layout of controller user-defined types (UDTs).
//!
//! Describe a record as an ordered list of named fields (scalars, byte and
//! text buffers, padding, packed flag bits, arrays and nested records), then
//! convert between raw bytes read from a controller and a [value::Value]
//! tree. Every field is placed at a multiple of its natural alignment, and a
//! record takes the largest alignment of anything it contains, so the
//! compiled offsets match the controller's own layout.
//!
//! ## Example
//!
//! ```
//! use udtcraft::builtins::{DINT, timer};
//! use udtcraft::field::Node;
//! use udtcraft::record::Record;
//! use udtcraft::schema::Schema;
//! use udtcraft::value::Value;
//!
//! let record = Record::builder()
//!     .field("Flags", Node::bools(["Run", "Fault"]))
//!     .field("Count", DINT)
//!     .field("Delay", timer())
//!     .build()
//!     .unwrap();
//! let schema = Schema::new(record).unwrap();
//! assert_eq!(schema.size(), 20);
//!
//! let mut data = schema.zeroed();
//! data[0] = 0b01;
//! data[4] = 7;
//! let value = schema.decode(&data).unwrap();
//! assert_eq!(value.get("Count"), Some(&Value::Int(7)));
//! assert_eq!(value.get("Flags").and_then(|f| f.get("Run")), Some(&Value::Bool(true)));
//! assert_eq!(schema.encode(&value).unwrap(), data);
//! ```

pub mod bits;
pub mod builtins;
mod codec;
pub mod compiled;
pub mod errors;
pub mod field;
pub mod record;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod slot;
pub mod text;
pub mod value;
