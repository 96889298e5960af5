//! PDF object value core
//!
//! `Obj` is a cheap, clonable handle to a PDF value. `null`, `true`, `false`
//! and well-known names are inline constants: cloning and dropping them is
//! free and they carry no flags. Every other value lives in a reference
//! counted cell that also carries the mark, dirty and memo bits and the
//! parent object number used by incremental save.
//!
//! Reads never fail. Asking an object for a value of the wrong kind returns a
//! zero value (`0`, `0.0`, `false`, empty), so use the `is_*` queries when the
//! distinction between "zero" and "not a number" matters.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use log::{trace, warn};

use crate::config::ObjectLimits;
use crate::error::{PdfError, PdfResult};
use super::document::{DocRef, Document};
use super::name::{KnownName, Name};

/// Highest object number a PDF file may use (Acrobat limit).
pub const MAX_OBJECT_NUMBER: i32 = 8_388_607;

bitflags! {
    /// Per-object state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub(crate) struct ObjFlags: u8 {
        const MARKED = 1 << 0;
        const DIRTY = 1 << 1;
        const MEMO_BM = 1 << 2;
        const MEMO_BM_VALUE = 1 << 3;
        const MEMO_OP = 1 << 4;
        const MEMO_OP_VALUE = 1 << 5;
    }
}

/// Kind of the active variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjKind {
    Null,
    Bool,
    Int,
    Real,
    Name,
    String,
    Array,
    Dict,
    Indirect,
}

impl ObjKind {
    /// Human-readable kind name.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjKind::Null => "null",
            ObjKind::Bool => "boolean",
            ObjKind::Int => "integer",
            ObjKind::Real => "real",
            ObjKind::Name => "name",
            ObjKind::String => "string",
            ObjKind::Array => "array",
            ObjKind::Dict => "dictionary",
            ObjKind::Indirect => "reference",
        }
    }
}

impl fmt::Display for ObjKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a structural comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    NotEqual,
    /// The walk hit the nesting limit; callers must treat this as not equal.
    DepthExceeded,
}

impl Comparison {
    /// True only for `Equal`; a depth overrun is not equality.
    pub fn is_equal(self) -> bool {
        self == Comparison::Equal
    }

    fn from_bool(equal: bool) -> Self {
        if equal {
            Comparison::Equal
        } else {
            Comparison::NotEqual
        }
    }
}

/// String payload. `hex` records whether the string was written as `<..>`.
#[derive(Debug, Clone)]
pub(crate) struct PdfString {
    pub(crate) bytes: Vec<u8>,
    pub(crate) hex: bool,
}

#[derive(Debug)]
pub(crate) struct ArrayData {
    pub(crate) doc: Option<DocRef>,
    pub(crate) items: Vec<Obj>,
}

#[derive(Debug)]
pub(crate) struct DictData {
    pub(crate) doc: Option<DocRef>,
    pub(crate) entries: Vec<(Name, Obj)>,
    pub(crate) sorted: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct IndirectRef {
    pub(crate) num: i32,
    pub(crate) gen: i32,
    pub(crate) doc: Option<DocRef>,
}

/// Heap-allocated variants.
#[derive(Debug)]
pub(crate) enum Value {
    Int(i64),
    Real(f32),
    Name(Rc<[u8]>),
    String(PdfString),
    Array(ArrayData),
    Dict(DictData),
    Indirect(IndirectRef),
}

impl Value {
    fn kind(&self) -> ObjKind {
        match self {
            Value::Int(_) => ObjKind::Int,
            Value::Real(_) => ObjKind::Real,
            Value::Name(_) => ObjKind::Name,
            Value::String(_) => ObjKind::String,
            Value::Array(_) => ObjKind::Array,
            Value::Dict(_) => ObjKind::Dict,
            Value::Indirect(_) => ObjKind::Indirect,
        }
    }

    fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Int(i) => Some(*i as f32),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ObjCell {
    pub(crate) flags: Cell<ObjFlags>,
    pub(crate) parent_num: Cell<i32>,
    pub(crate) value: RefCell<Value>,
}

#[derive(Clone)]
enum Repr {
    Null,
    Bool(bool),
    Name(KnownName),
    Heap(Rc<ObjCell>),
}

/// Handle to a PDF object.
///
/// Cloning a handle keeps the object alive; dropping the last handle frees
/// it together with the references it holds to its children. The graph is
/// single threaded: handles are neither `Send` nor `Sync`.
#[derive(Clone)]
pub struct Obj(Repr);

impl Default for Obj {
    fn default() -> Self {
        Obj::null()
    }
}

impl Obj {
    // ---- construction ----------------------------------------------------

    /// The null constant.
    pub const fn null() -> Obj {
        Obj(Repr::Null)
    }

    /// A boolean constant.
    pub const fn bool(b: bool) -> Obj {
        Obj(Repr::Bool(b))
    }

    /// Interned name constant.
    pub const fn known(name: KnownName) -> Obj {
        Obj(Repr::Name(name))
    }

    fn heap(value: Value) -> Obj {
        Obj(Repr::Heap(Rc::new(ObjCell {
            flags: Cell::new(ObjFlags::empty()),
            parent_num: Cell::new(0),
            value: RefCell::new(value),
        })))
    }

    /// Create new integer object
    pub fn new_int(i: i64) -> Obj {
        Obj::heap(Value::Int(i))
    }

    /// Create new real object
    pub fn new_real(f: f32) -> Obj {
        Obj::heap(Value::Real(f))
    }

    /// Create a name, using the interned constant when the text is well known.
    pub fn new_name(text: &str) -> Obj {
        Obj::new_name_bytes(text.as_bytes())
    }

    /// Create a name from its unescaped bytes, which need not be UTF-8.
    pub fn new_name_bytes(bytes: &[u8]) -> Obj {
        match KnownName::lookup_bytes(bytes) {
            Some(known) => Obj::known(known),
            None => Obj::heap(Value::Name(Rc::from(bytes))),
        }
    }

    /// Name object sharing the storage of `name`.
    pub fn from_name(name: &Name) -> Obj {
        match name {
            Name::Known(known) => Obj::known(*known),
            Name::Custom(bytes) => match KnownName::lookup_bytes(bytes) {
                Some(known) => Obj::known(known),
                None => Obj::heap(Value::Name(Rc::clone(bytes))),
            },
        }
    }

    /// Literal string.
    pub fn new_string(bytes: &[u8]) -> Obj {
        Obj::heap(Value::String(PdfString {
            bytes: bytes.to_vec(),
            hex: false,
        }))
    }

    /// String that serializes in hexadecimal form.
    pub fn new_hex_string(bytes: &[u8]) -> Obj {
        Obj::heap(Value::String(PdfString {
            bytes: bytes.to_vec(),
            hex: true,
        }))
    }

    /// Indirect reference `num gen R`, optionally bound to its document.
    pub fn new_indirect(doc: Option<&DocRef>, num: i32, gen: i32) -> PdfResult<Obj> {
        if !(0..=MAX_OBJECT_NUMBER).contains(&num) {
            return Err(PdfError::ObjectNumberOutOfRange(i64::from(num)));
        }
        Ok(Obj::heap(Value::Indirect(IndirectRef {
            num,
            gen,
            doc: doc.cloned(),
        })))
    }

    /// Create an empty array, optionally bound to a document.
    pub fn new_array(doc: Option<&DocRef>, initial_capacity: usize) -> Obj {
        Obj::heap(Value::Array(ArrayData {
            doc: doc.cloned(),
            items: Vec::with_capacity(initial_capacity),
        }))
    }

    /// Create an empty dictionary, optionally bound to a document.
    pub fn new_dict(doc: Option<&DocRef>, initial_capacity: usize) -> Obj {
        Obj::heap(Value::Dict(DictData {
            doc: doc.cloned(),
            entries: Vec::with_capacity(initial_capacity),
            sorted: false,
        }))
    }

    // ---- ownership -------------------------------------------------------

    /// Take another reference to the same object.
    pub fn keep(&self) -> Obj {
        self.clone()
    }

    /// Release this reference.
    pub fn drop_obj(self) {}

    /// Number of live handles, or 0 for the non-counted constants.
    pub fn ref_count(&self) -> usize {
        match &self.0 {
            Repr::Heap(cell) => Rc::strong_count(cell),
            _ => 0,
        }
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Obj) -> bool {
        match (&self.0, &other.0) {
            (Repr::Null, Repr::Null) => true,
            (Repr::Bool(a), Repr::Bool(b)) => a == b,
            (Repr::Name(a), Repr::Name(b)) => a == b,
            (Repr::Heap(a), Repr::Heap(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub(crate) fn cell(&self) -> Option<&Rc<ObjCell>> {
        match &self.0 {
            Repr::Heap(cell) => Some(cell),
            _ => None,
        }
    }

    pub(crate) fn value(&self) -> Option<Ref<'_, Value>> {
        self.cell().map(|cell| cell.value.borrow())
    }

    pub(crate) fn value_mut(&self) -> Option<RefMut<'_, Value>> {
        self.cell().map(|cell| cell.value.borrow_mut())
    }

    // ---- kind queries ----------------------------------------------------

    /// Kind of this handle, without resolving references.
    pub fn kind(&self) -> ObjKind {
        match &self.0 {
            Repr::Null => ObjKind::Null,
            Repr::Bool(_) => ObjKind::Bool,
            Repr::Name(_) => ObjKind::Name,
            Repr::Heap(cell) => cell.value.borrow().kind(),
        }
    }

    /// Kind name of the resolved object, for error messages.
    pub fn type_name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Kind after resolving indirect references.
    pub fn resolved_kind(&self) -> ObjKind {
        self.resolve().kind()
    }

    /// Whether this is an indirect reference. Does not resolve.
    pub fn is_indirect(&self) -> bool {
        self.kind() == ObjKind::Indirect
    }

    pub fn is_null(&self) -> bool {
        self.resolved_kind() == ObjKind::Null
    }

    pub fn is_bool(&self) -> bool {
        self.resolved_kind() == ObjKind::Bool
    }

    pub fn is_int(&self) -> bool {
        self.resolved_kind() == ObjKind::Int
    }

    pub fn is_real(&self) -> bool {
        self.resolved_kind() == ObjKind::Real
    }

    /// Integer or real.
    pub fn is_number(&self) -> bool {
        matches!(self.resolved_kind(), ObjKind::Int | ObjKind::Real)
    }

    pub fn is_name(&self) -> bool {
        self.resolved_kind() == ObjKind::Name
    }

    pub fn is_string(&self) -> bool {
        self.resolved_kind() == ObjKind::String
    }

    pub fn is_array(&self) -> bool {
        self.resolved_kind() == ObjKind::Array
    }

    pub fn is_dict(&self) -> bool {
        self.resolved_kind() == ObjKind::Dict
    }

    /// Whether this is a reference to a stream object of its document.
    pub fn is_stream(&self) -> bool {
        match self.indirect_parts() {
            Some((num, _, Some(doc))) => doc.obj_num_is_stream(num),
            _ => false,
        }
    }

    // ---- indirect references ---------------------------------------------

    fn indirect_parts(&self) -> Option<(i32, i32, Option<DocRef>)> {
        match self.value().as_deref() {
            Some(Value::Indirect(r)) => Some((r.num, r.gen, r.doc.clone())),
            _ => None,
        }
    }

    /// Object number of a reference, 0 otherwise.
    pub fn to_num(&self) -> i32 {
        self.indirect_parts().map(|(num, _, _)| num).unwrap_or(0)
    }

    /// Generation of a reference, 0 otherwise.
    pub fn to_gen(&self) -> i32 {
        self.indirect_parts().map(|(_, gen, _)| gen).unwrap_or(0)
    }

    /// Follow indirect references to a concrete object.
    ///
    /// Returns the handle unchanged when it is not a reference or the
    /// reference cannot be resolved: no live document, missing object, or a
    /// generation that no longer matches the document's.
    pub fn resolve(&self) -> Obj {
        self.resolve_chain(ObjectLimits::default().max_resolve_chain)
    }

    /// Follow references for at most `max_hops` steps.
    pub fn resolve_chain(&self, max_hops: usize) -> Obj {
        if self.cell().is_none() {
            return self.clone();
        }
        let mut current = self.clone();
        for _ in 0..=max_hops {
            let Some((num, gen, doc)) = current.indirect_parts() else {
                return current;
            };
            let Some(doc) = doc.and_then(|doc| doc.upgrade()) else {
                trace!("Reference {} {} R has no live document", num, gen);
                return self.clone();
            };
            if let Some(current_gen) = doc.current_generation(num) {
                if current_gen != gen {
                    warn!(
                        "Stale reference {} {} R (document generation is {})",
                        num, gen, current_gen
                    );
                    return self.clone();
                }
            }
            match doc.load_object(num) {
                Some(next) => {
                    trace!("Resolved {} {} R", num, gen);
                    current = next;
                }
                None => {
                    warn!("Object {} {} R not found", num, gen);
                    return self.clone();
                }
            }
        }
        if current.is_indirect() {
            warn!("Too many indirections resolving {} {} R", self.to_num(), self.to_gen());
            return self.clone();
        }
        current
    }

    pub(crate) fn bound_doc_ref(&self) -> Option<DocRef> {
        match self.value().as_deref() {
            Some(Value::Indirect(r)) => r.doc.clone(),
            Some(Value::Array(a)) => a.doc.clone(),
            Some(Value::Dict(d)) => d.doc.clone(),
            _ => None,
        }
    }

    /// Document an indirect reference points into.
    pub fn get_indirect_document(&self) -> Option<Rc<dyn Document>> {
        match self.indirect_parts() {
            Some((_, _, doc)) => doc.and_then(|doc| doc.upgrade()),
            None => None,
        }
    }

    /// Document an array, dictionary or reference is bound to.
    pub fn get_bound_document(&self) -> Option<Rc<dyn Document>> {
        self.bound_doc_ref().and_then(|doc| doc.upgrade())
    }

    // ---- safe accessors --------------------------------------------------

    /// `true` only for the boolean `true`.
    pub fn to_bool(&self) -> bool {
        matches!(self.resolve().0, Repr::Bool(true))
    }

    /// Integer value; reals truncate toward zero, other kinds give 0.
    pub fn to_int64(&self) -> i64 {
        let obj = self.resolve();
        let value = obj.value();
        match value.as_deref() {
            Some(Value::Int(i)) => *i,
            Some(Value::Real(r)) => *r as i64,
            _ => 0,
        }
    }

    /// Like `to_int64`, clamped into `i32`.
    pub fn to_int(&self) -> i32 {
        let wide = self.to_int64();
        i32::try_from(wide).unwrap_or(if wide < 0 { i32::MIN } else { i32::MAX })
    }

    /// Real value; integers convert, other kinds give 0.0.
    pub fn to_real(&self) -> f32 {
        let obj = self.resolve();
        let value = obj.value();
        value.as_deref().and_then(Value::as_f32).unwrap_or(0.0)
    }

    /// Name value, or the empty name.
    pub fn to_name(&self) -> Name {
        self.resolve().name_value().unwrap_or_else(Name::empty)
    }

    fn name_value(&self) -> Option<Name> {
        match &self.0 {
            Repr::Name(known) => Some(Name::Known(*known)),
            Repr::Heap(cell) => match &*cell.value.borrow() {
                Value::Name(bytes) => Some(Name::Custom(Rc::clone(bytes))),
                _ => None,
            },
            _ => None,
        }
    }

    /// Copy of the string bytes, or empty.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.with_bytes(|bytes| bytes.to_vec())
    }

    /// Run `f` over the string bytes (empty for non-strings).
    pub fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let obj = self.resolve();
        let value = obj.value();
        match value.as_deref() {
            Some(Value::String(s)) => f(&s.bytes),
            _ => f(&[]),
        }
    }

    /// Length of a string object in bytes, 0 for other kinds.
    pub fn to_str_len(&self) -> usize {
        self.with_bytes(|bytes| bytes.len())
    }

    /// Whether the string was created in hexadecimal form.
    pub fn is_hex_string(&self) -> bool {
        let obj = self.resolve();
        let value = obj.value();
        matches!(value.as_deref(), Some(Value::String(s)) if s.hex)
    }

    // ---- scalar mutators -------------------------------------------------

    /// Overwrite an integer in place. Ignored for any other kind.
    pub fn set_int(&self, i: i64) {
        let changed = match self.value_mut().as_deref_mut() {
            Some(Value::Int(slot)) => {
                *slot = i;
                true
            }
            _ => false,
        };
        if changed {
            self.dirty();
        }
    }

    /// Overwrite a real in place. Ignored for any other kind.
    pub fn set_real(&self, f: f32) {
        let changed = match self.value_mut().as_deref_mut() {
            Some(Value::Real(slot)) => {
                *slot = f;
                true
            }
            _ => false,
        };
        if changed {
            self.dirty();
        }
    }

    /// Shorten a string. Ignored for other kinds and for lengths that
    /// would grow the string.
    pub fn set_string_length(&self, len: usize) {
        let changed = match self.value_mut().as_deref_mut() {
            Some(Value::String(s)) if len <= s.bytes.len() => {
                s.bytes.truncate(len);
                true
            }
            _ => false,
        };
        if changed {
            self.dirty();
        }
    }

    // ---- comparison ------------------------------------------------------

    /// Structural comparison without resolving references.
    pub fn compare(&self, other: &Obj) -> Comparison {
        self.compare_with(other, false, &ObjectLimits::default())
    }

    /// Structural comparison resolving references on both sides.
    pub fn compare_resolving(&self, other: &Obj) -> Comparison {
        self.compare_with(other, true, &ObjectLimits::default())
    }

    /// Structural comparison with explicit resolution and limits.
    pub fn compare_with(&self, other: &Obj, resolve: bool, limits: &ObjectLimits) -> Comparison {
        compare_at(self, other, resolve, 0, limits)
    }

    /// Whether both objects are names with the same text. No resolution.
    pub fn name_eq(&self, other: &Obj) -> bool {
        match (self.name_value(), other.name_value()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Whether this object is the given well-known name.
    pub fn is_known_name(&self, name: KnownName) -> bool {
        match &self.0 {
            Repr::Name(known) => *known == name,
            _ => false,
        }
    }
}

fn compare_at(a: &Obj, b: &Obj, resolve: bool, depth: usize, limits: &ObjectLimits) -> Comparison {
    if depth > limits.max_depth {
        warn!("Comparison exceeded nesting limit of {}", limits.max_depth);
        return Comparison::DepthExceeded;
    }
    let (a, b) = if resolve {
        (
            a.resolve_chain(limits.max_resolve_chain),
            b.resolve_chain(limits.max_resolve_chain),
        )
    } else {
        (a.clone(), b.clone())
    };
    if a.ptr_eq(&b) {
        return Comparison::Equal;
    }
    match (&a.0, &b.0) {
        (Repr::Bool(x), Repr::Bool(y)) => Comparison::from_bool(x == y),
        (Repr::Name(_), _) | (_, Repr::Name(_)) => Comparison::from_bool(a.name_eq(&b)),
        (Repr::Heap(x), Repr::Heap(y)) => {
            let x = x.value.borrow();
            let y = y.value.borrow();
            compare_values(&x, &y, resolve, depth, limits)
        }
        _ => Comparison::NotEqual,
    }
}

fn compare_values(
    a: &Value,
    b: &Value,
    resolve: bool,
    depth: usize,
    limits: &ObjectLimits,
) -> Comparison {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Comparison::from_bool(x == y),
        (Value::Int(_) | Value::Real(_), Value::Int(_) | Value::Real(_)) => {
            Comparison::from_bool(a.as_f32() == b.as_f32())
        }
        (Value::Name(x), Value::Name(y)) => Comparison::from_bool(x == y),
        (Value::String(x), Value::String(y)) => Comparison::from_bool(x.bytes == y.bytes),
        (Value::Indirect(x), Value::Indirect(y)) => {
            Comparison::from_bool(x.num == y.num && x.gen == y.gen)
        }
        (Value::Array(x), Value::Array(y)) => {
            if x.items.len() != y.items.len() {
                return Comparison::NotEqual;
            }
            for (p, q) in x.items.iter().zip(&y.items) {
                match compare_at(p, q, resolve, depth + 1, limits) {
                    Comparison::Equal => {}
                    other => return other,
                }
            }
            Comparison::Equal
        }
        (Value::Dict(x), Value::Dict(y)) => {
            if x.entries.len() != y.entries.len() {
                return Comparison::NotEqual;
            }
            for (key, p) in &x.entries {
                let Some(idx) = y.find(key) else {
                    return Comparison::NotEqual;
                };
                match compare_at(p, &y.entries[idx].1, resolve, depth + 1, limits) {
                    Comparison::Equal => {}
                    other => return other,
                }
            }
            Comparison::Equal
        }
        _ => Comparison::NotEqual,
    }
}

impl PartialEq for Obj {
    fn eq(&self, other: &Obj) -> bool {
        self.compare(other).is_equal()
    }
}

impl fmt::Debug for Obj {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<bool> for Obj {
    fn from(b: bool) -> Self {
        Obj::bool(b)
    }
}

impl From<i64> for Obj {
    fn from(i: i64) -> Self {
        Obj::new_int(i)
    }
}

impl From<i32> for Obj {
    fn from(i: i32) -> Self {
        Obj::new_int(i64::from(i))
    }
}

impl From<f32> for Obj {
    fn from(f: f32) -> Self {
        Obj::new_real(f)
    }
}

impl From<KnownName> for Obj {
    fn from(name: KnownName) -> Self {
        Obj::known(name)
    }
}

impl From<&Name> for Obj {
    fn from(name: &Name) -> Self {
        Obj::from_name(name)
    }
}
