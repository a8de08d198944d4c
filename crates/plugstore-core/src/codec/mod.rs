//! Self-describing value encoding.
//!
//! Values are written as JSON text. Plain scalars, lists and maps use their
//! natural JSON form; anything JSON cannot express on its own is wrapped in an
//! envelope object carrying a `$type` tag:
//!
//! ```text
//! {"$type": "<tag>", "$fields": {...}}     registered record type
//! {"$type": "map", "$entries": {...}}      map that itself has a `$type` key
//! {"$type": "float", "$value": "NaN"}      non-finite float
//! ```
//!
//! Record tags are resolved through a [`TypeRegistry`] when decoding.

mod registry;
mod value;

pub use registry::TypeRegistry;
pub use value::{DynRecord, Persist, Value};

/// Discriminator key of an envelope object.
pub const TYPE_KEY: &str = "$type";
/// Field data of a record envelope.
pub const FIELDS_KEY: &str = "$fields";
/// Entries of an escaped map envelope.
pub const ENTRIES_KEY: &str = "$entries";
/// Textual value of a non-finite float envelope.
pub const FLOAT_VALUE_KEY: &str = "$value";

const MAP_TAG: &str = "map";
const FLOAT_TAG: &str = "float";

/// Tags used by the encoding itself; records cannot claim them.
pub const RESERVED_TAGS: [&str; 2] = [MAP_TAG, FLOAT_TAG];
