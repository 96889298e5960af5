//! Interface to the owning document service
//!
//! The object model never owns a document. Arrays, dictionaries and indirect
//! references hold a `DocRef`, a weak handle that stops resolving once the
//! document is gone.

use std::fmt;
use std::rc::{Rc, Weak};

use super::object::Obj;

/// Services the object model consumes from a document.
pub trait Document {
    /// Load the object stored under `num`, if any.
    fn load_object(&self, num: i32) -> Option<Obj>;

    /// Generation currently recorded for `num`.
    fn current_generation(&self, num: i32) -> Option<i32>;

    /// Whether `num` names a stream object.
    fn is_stream(&self, num: i32) -> bool;

    /// Decoded bytes of stream `num`.
    fn load_stream(&self, _num: i32) -> Option<Vec<u8>> {
        None
    }

    /// Called when a subobject of indirect object `num` has been mutated,
    /// so the object can be scheduled for incremental save.
    fn object_altered(&self, _num: i32) {}
}

/// Non-owning handle to a document.
#[derive(Clone)]
pub struct DocRef(Weak<dyn Document>);

impl DocRef {
    /// Create a handle to a concrete document.
    pub fn new<D: Document + 'static>(doc: &Rc<D>) -> Self {
        let weak: Weak<D> = Rc::downgrade(doc);
        Self(weak)
    }

    /// Create a handle from a type-erased document.
    pub fn from_dyn(doc: &Rc<dyn Document>) -> Self {
        Self(Rc::downgrade(doc))
    }

    pub(crate) fn from_weak(doc: Weak<dyn Document>) -> Self {
        Self(doc)
    }

    /// Strong reference to the document, if it is still alive.
    pub fn upgrade(&self) -> Option<Rc<dyn Document>> {
        self.0.upgrade()
    }

    /// Whether the document is still alive.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }

    /// Whether object `num` of this document is a stream. False once the
    /// document is gone.
    pub fn obj_num_is_stream(&self, num: i32) -> bool {
        self.upgrade().map_or(false, |doc| doc.is_stream(num))
    }

    /// Whether both handles refer to the same document.
    pub fn same_document(&self, other: &DocRef) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocRef")
            .field("alive", &self.is_alive())
            .finish()
    }
}
