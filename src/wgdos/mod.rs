//! The WGDOS row and field codec.
//!
//! `row` holds the per-row header, bitmap, and digit-stream primitives;
//! `field` owns the field header and the row-selection policy that ties
//! them together into `wgdos_pack`/`wgdos_unpack`.

pub mod field;
pub mod row;

pub use field::{wgdos_pack, wgdos_unpack, wgdos_unpack_lenient, FieldHeader, RowDiagnostic, FIELD_HEADER_BYTES};
pub use row::{Bitmaps, RowHeader, ROW_HEADER_BYTES};
