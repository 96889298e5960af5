//! PDF object model

pub mod array;
pub mod cookie;
pub mod dict;
pub mod document;
pub mod geometry;
pub mod graph;
pub mod name;
pub mod object;
pub mod parser;
pub mod serialize;
pub mod text;
pub mod xref;

pub use cookie::Cookie;
pub use dict::DictKey;
pub use document::{DocRef, Document};
pub use geometry::{Matrix, Point, Rect};
pub use graph::{MarkGuard, MemoSlot};
pub use name::{KnownName, Name};
pub use object::{Comparison, Obj, ObjKind, MAX_OBJECT_NUMBER};
pub use parser::{parse_object, IndirectObject, Parser};
pub use serialize::{debug_obj, print_encrypted_obj, print_indirect_object, print_obj, sprint_obj, Serializer};
pub use text::{decode_text_string, encode_text_string};
pub use xref::XRefTable;
