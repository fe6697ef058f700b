//! Convenient re-exports of commonly used types from docjson.
//!
//! Import this prelude module to quickly access the most frequently used
//! types and functions without needing to import from multiple sub-modules:
//!
//! ```ignore
//! use docjson::prelude::*;
//! ```

pub use docjson_core::{
    annotate::Annotations,
    decode::{decode, decode_many, decode_value},
    document::{DocumentLoader, JsonDocument},
    encode::{EncodeOptions, Encoder, encode, encode_with_loader},
    error::{DocJsonError, DocJsonResult},
    page::{FieldPagination, Pagination, paginate, paginate_field},
    schema::{Exclude, FieldClass, FieldKind, FieldSpec, ScalarKind, Schema, SchemaRef, classify},
};
