//! PDF object model for Rust
//!
//! Reference counted PDF values (null, booleans, numbers, names, strings,
//! arrays, dictionaries and indirect references) with the container
//! operations, graph utilities and serializer a PDF writer needs.
//!
//! ```
//! use pdf_objects::{Obj, PdfResult};
//!
//! fn page() -> PdfResult<Vec<u8>> {
//!     let dict = Obj::new_dict(None, 2);
//!     dict.dict_put_name("Type", "Page")?;
//!     dict.dict_putp("Resources/Font/F1", &Obj::new_name("Helvetica"))?;
//!     dict.to_pdf_bytes(true)
//! }
//! # assert_eq!(page().unwrap(), b"<</Type/Page/Resources<</Font<</F1/Helvetica>>>>>>".to_vec());
//! ```
//!
//! Objects may be bound to a [`Document`], which resolves indirect
//! references and is told when a stored object is mutated. [`XRefTable`] is
//! an in-memory document that can load and write object bodies.

pub mod config;
pub mod crypto;
pub mod error;
pub mod pdf;

pub use config::ObjectLimits;
pub use crypto::{Crypt, CryptEngine, CryptMethod};
pub use error::{PdfError, PdfResult};
pub use pdf::{
    parse_object, Comparison, Cookie, DictKey, DocRef, Document, KnownName, MarkGuard, Matrix,
    MemoSlot, Name, Obj, ObjKind, Point, Rect, Serializer, XRefTable, MAX_OBJECT_NUMBER,
};
