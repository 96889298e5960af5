//! In-memory object table implementing [`Document`]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;
use std::rc::{Rc, Weak};

use log::{debug, trace};

use crate::error::{PdfError, PdfResult};
use super::document::{DocRef, Document};
use super::object::{Obj, MAX_OBJECT_NUMBER};
use super::parser::Parser;
use super::serialize::Serializer;

#[derive(Debug, Clone)]
struct XRefEntry {
    gen: i32,
    obj: Obj,
    stream: Option<Vec<u8>>,
}

/// Cross-reference table holding every object of a document in memory.
///
/// Objects inserted here are stamped with their object number, so mutating
/// any container reachable from them records the number in the altered set.
pub struct XRefTable {
    entries: RefCell<BTreeMap<i32, XRefEntry>>,
    altered: RefCell<BTreeSet<i32>>,
    me: Weak<XRefTable>,
}

impl XRefTable {
    /// Create an empty table.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|me| Self {
            entries: RefCell::new(BTreeMap::new()),
            altered: RefCell::new(BTreeSet::new()),
            me: me.clone(),
        })
    }

    /// Weak handle for binding objects to this table.
    pub fn doc_ref(&self) -> DocRef {
        let weak: Weak<dyn Document> = self.me.clone();
        DocRef::from_weak(weak)
    }

    /// Reference `num gen R` bound to this table.
    pub fn new_indirect(&self, num: i32, gen: i32) -> PdfResult<Obj> {
        Obj::new_indirect(Some(&self.doc_ref()), num, gen)
    }

    fn check_num(num: i32) -> PdfResult<()> {
        if num <= 0 || num > MAX_OBJECT_NUMBER {
            return Err(PdfError::ObjectNumberOutOfRange(i64::from(num)));
        }
        Ok(())
    }

    /// Store `obj` as object `num gen`, replacing any previous entry.
    pub fn insert(&self, num: i32, gen: i32, obj: Obj) -> PdfResult<()> {
        self.insert_entry(num, gen, obj, None)
    }

    /// Store a stream object: its dictionary plus decoded data.
    pub fn insert_stream(&self, num: i32, gen: i32, dict: Obj, data: Vec<u8>) -> PdfResult<()> {
        if !dict.is_dict() {
            return Err(PdfError::type_mismatch("dict", dict.type_name()));
        }
        self.insert_entry(num, gen, dict, Some(data))
    }

    fn insert_entry(&self, num: i32, gen: i32, obj: Obj, stream: Option<Vec<u8>>) -> PdfResult<()> {
        Self::check_num(num)?;
        trace!("Storing object {} {} ({})", num, gen, obj.type_name());
        obj.set_obj_parent(num);
        let old = self
            .entries
            .borrow_mut()
            .insert(num, XRefEntry { gen, obj, stream });
        drop(old);
        Ok(())
    }

    /// Store `obj` under the next free number and return a reference to it.
    pub fn add_object(&self, obj: Obj) -> PdfResult<Obj> {
        let num = self
            .entries
            .borrow()
            .keys()
            .next_back()
            .map_or(1, |last| last + 1);
        self.insert(num, 0, obj)?;
        self.new_indirect(num, 0)
    }

    /// Stored object `num`, if any.
    pub fn get(&self, num: i32) -> Option<Obj> {
        self.entries.borrow().get(&num).map(|e| e.obj.clone())
    }

    /// Remove object `num`, returning it.
    pub fn remove(&self, num: i32) -> Option<Obj> {
        let entry = self.entries.borrow_mut().remove(&num);
        self.altered.borrow_mut().remove(&num);
        entry.map(|e| e.obj)
    }

    /// Advance the generation of `num`, leaving older references stale.
    pub fn bump_generation(&self, num: i32) -> Option<i32> {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.get_mut(&num)?;
        entry.gen += 1;
        Some(entry.gen)
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Object numbers in ascending order.
    pub fn numbers(&self) -> Vec<i32> {
        self.entries.borrow().keys().copied().collect()
    }

    /// Objects changed since load, in ascending order.
    pub fn altered(&self) -> Vec<i32> {
        self.altered.borrow().iter().copied().collect()
    }

    /// Drain the set of altered object numbers.
    pub fn take_altered(&self) -> Vec<i32> {
        std::mem::take(&mut *self.altered.borrow_mut())
            .into_iter()
            .collect()
    }

    /// Read consecutive `N G obj ... endobj` bodies from `data`.
    ///
    /// Reading stops at a cross-reference section or trailer. Returns the
    /// number of objects stored.
    pub fn load(&self, data: &[u8]) -> PdfResult<usize> {
        let mut parser = Parser::new(data).with_document(self.doc_ref());
        let mut count = 0;
        while !parser.at_end() {
            let rest = &data[parser.position()..];
            if [&b"xref"[..], b"trailer", b"startxref"]
                .iter()
                .any(|kw| rest.starts_with(kw))
            {
                debug!("Stopping load at offset {}", parser.position());
                break;
            }
            let body = parser.parse_indirect_object()?;
            self.insert_entry(body.num, body.gen, body.obj, body.stream)?;
            count += 1;
        }
        debug!("Loaded {} objects", count);
        Ok(count)
    }

    /// Write every object, or only the altered ones, as indirect object
    /// bodies.
    pub fn write_objects<W: Write + ?Sized>(
        &self,
        out: &mut W,
        serializer: &Serializer<'_>,
        only_altered: bool,
    ) -> PdfResult<usize> {
        let snapshot: Vec<(i32, XRefEntry)> = {
            let entries = self.entries.borrow();
            let altered = self.altered.borrow();
            entries
                .iter()
                .filter(|(num, _)| !only_altered || altered.contains(num))
                .map(|(num, e)| (*num, e.clone()))
                .collect()
        };
        for (num, entry) in &snapshot {
            serializer.print_indirect_object(out, *num, entry.gen, &entry.obj, entry.stream.as_deref())?;
        }
        Ok(snapshot.len())
    }
}

impl Document for XRefTable {
    fn load_object(&self, num: i32) -> Option<Obj> {
        self.get(num)
    }

    fn current_generation(&self, num: i32) -> Option<i32> {
        self.entries.borrow().get(&num).map(|e| e.gen)
    }

    fn is_stream(&self, num: i32) -> bool {
        self.entries
            .borrow()
            .get(&num)
            .map_or(false, |e| e.stream.is_some())
    }

    fn load_stream(&self, num: i32) -> Option<Vec<u8>> {
        self.entries.borrow().get(&num).and_then(|e| e.stream.clone())
    }

    fn object_altered(&self, num: i32) {
        trace!("Object {} altered", num);
        self.altered.borrow_mut().insert(num);
    }
}

impl fmt::Debug for XRefTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("XRefTable")
            .field("objects", &self.len())
            .field("altered", &self.altered())
            .finish()
    }
}
