//! Graph-safety utilities
//!
//! Mark bits guard recursive walks against cycles, memo bits cache the
//! result of expensive idempotent queries, and the dirty bit plus parent
//! numbers drive incremental save.

use log::{debug, warn};

use crate::config::ObjectLimits;
use crate::error::{PdfError, PdfResult};
use super::object::{ArrayData, DictData, Obj, ObjFlags, PdfString, Value};

/// Memo slot selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoSlot {
    /// "Uses a blend mode" cache.
    BlendMode,
    /// Operator-pass cache.
    Operators,
}

impl MemoSlot {
    fn bits(self) -> (ObjFlags, ObjFlags) {
        match self {
            MemoSlot::BlendMode => (ObjFlags::MEMO_BM, ObjFlags::MEMO_BM_VALUE),
            MemoSlot::Operators => (ObjFlags::MEMO_OP, ObjFlags::MEMO_OP_VALUE),
        }
    }
}

/// Scoped mark. The object is unmarked when the guard goes out of scope,
/// including on early return and `?` propagation.
#[must_use = "the mark is released when the guard is dropped"]
pub struct MarkGuard<'a> {
    obj: &'a Obj,
}

impl Drop for MarkGuard<'_> {
    fn drop(&mut self) {
        self.obj.unmark();
    }
}

impl Obj {
    fn flags(&self) -> ObjFlags {
        self.cell().map(|cell| cell.flags.get()).unwrap_or_default()
    }

    fn update_flags(&self, set: ObjFlags, clear: ObjFlags) {
        if let Some(cell) = self.cell() {
            let mut flags = cell.flags.get();
            flags.remove(clear);
            flags.insert(set);
            cell.flags.set(flags);
        }
    }

    // ---- mark ------------------------------------------------------------

    /// Set the mark bit, returning whether it was already set.
    ///
    /// Constants cannot form cycles and are never marked.
    pub fn mark(&self) -> bool {
        let was = self.is_marked();
        self.update_flags(ObjFlags::MARKED, ObjFlags::empty());
        was
    }

    /// Clear the mark set by `mark`.
    pub fn unmark(&self) {
        self.update_flags(ObjFlags::empty(), ObjFlags::MARKED);
    }

    pub fn is_marked(&self) -> bool {
        self.flags().contains(ObjFlags::MARKED)
    }

    /// Mark for the lifetime of the returned guard. `None` means the object
    /// is already on the current traversal path.
    pub fn mark_guard(&self) -> Option<MarkGuard<'_>> {
        if self.mark() {
            None
        } else {
            Some(MarkGuard { obj: self })
        }
    }

    // ---- memo ------------------------------------------------------------

    /// Record a memo value for `slot`.
    pub fn set_memo(&self, slot: MemoSlot, value: bool) {
        let (present, bit) = slot.bits();
        if value {
            self.update_flags(present | bit, ObjFlags::empty());
        } else {
            self.update_flags(present, bit);
        }
    }

    /// Cached value for `slot`, if one was stored.
    pub fn memo(&self, slot: MemoSlot) -> Option<bool> {
        let (present, bit) = slot.bits();
        let flags = self.flags();
        flags.contains(present).then(|| flags.contains(bit))
    }

    // ---- dirty -----------------------------------------------------------

    /// Flag the object as modified since the last save.
    pub fn dirty(&self) {
        self.update_flags(ObjFlags::DIRTY, ObjFlags::empty());
    }

    /// Clear the modified flag.
    pub fn clean(&self) {
        self.update_flags(ObjFlags::empty(), ObjFlags::DIRTY);
    }

    pub fn is_dirty(&self) -> bool {
        self.flags().contains(ObjFlags::DIRTY)
    }

    // ---- parent numbers --------------------------------------------------

    /// Object number of the nearest indirect ancestor, 0 if unknown.
    pub fn parent_num(&self) -> i32 {
        match self.value().as_deref() {
            Some(Value::Array(_) | Value::Dict(_)) => {
                self.cell().map(|cell| cell.parent_num.get()).unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Stamp this container and everything reachable from it without
    /// crossing an indirect reference with parent number `num`.
    pub fn set_obj_parent(&self, num: i32) {
        stamp_parent(self, num, 0, ObjectLimits::default().max_depth);
    }

    // ---- copies ----------------------------------------------------------

    /// Shallow copy of an array: a new array holding the same children.
    pub fn copy_array(&self) -> PdfResult<Obj> {
        let obj = self.resolve();
        let value = obj.value();
        match value.as_deref() {
            Some(Value::Array(a)) => {
                let copy = Obj::new_array(a.doc.as_ref(), a.items.len());
                if let Some(mut v) = copy.value_mut() {
                    if let Value::Array(dst) = &mut *v {
                        dst.items.extend(a.items.iter().cloned());
                    }
                }
                Ok(copy)
            }
            _ => Err(PdfError::type_mismatch("array", obj.type_name())),
        }
    }

    /// Shallow copy of a dictionary.
    pub fn copy_dict(&self) -> PdfResult<Obj> {
        let obj = self.resolve();
        let value = obj.value();
        match value.as_deref() {
            Some(Value::Dict(d)) => {
                let copy = Obj::new_dict(d.doc.as_ref(), d.entries.len());
                if let Some(mut v) = copy.value_mut() {
                    if let Value::Dict(dst) = &mut *v {
                        dst.entries.extend(d.entries.iter().cloned());
                        dst.sorted = d.sorted;
                    }
                }
                Ok(copy)
            }
            _ => Err(PdfError::type_mismatch("dictionary", obj.type_name())),
        }
    }

    /// Recursive copy of arrays, dictionaries and mutable scalars.
    ///
    /// Indirect references and names are shared, not followed. A cyclic
    /// graph is reported as `CycleDetected`.
    pub fn deep_copy(&self) -> PdfResult<Obj> {
        deep_copy_at(self, 0, &ObjectLimits::default())
    }

    /// Deep copy using custom limits.
    pub fn deep_copy_with(&self, limits: &ObjectLimits) -> PdfResult<Obj> {
        deep_copy_at(self, 0, limits)
    }
}

fn stamp_parent(obj: &Obj, num: i32, depth: usize, limit: usize) {
    let Some(cell) = obj.cell() else {
        return;
    };
    let value = cell.value.borrow();
    if !matches!(&*value, Value::Array(_) | Value::Dict(_)) {
        return;
    }
    if cell.parent_num.get() == num {
        return;
    }
    cell.parent_num.set(num);
    if depth >= limit {
        warn!("Parent stamping stopped at nesting limit {}", limit);
        return;
    }
    match &*value {
        Value::Array(a) => {
            for child in &a.items {
                stamp_parent(child, num, depth + 1, limit);
            }
        }
        Value::Dict(d) => {
            for (_, child) in &d.entries {
                stamp_parent(child, num, depth + 1, limit);
            }
        }
        _ => {}
    }
}

fn deep_copy_at(obj: &Obj, depth: usize, limits: &ObjectLimits) -> PdfResult<Obj> {
    if depth > limits.max_depth {
        warn!("Deep copy exceeded nesting limit of {}", limits.max_depth);
        return Err(PdfError::RecursionLimit(limits.max_depth));
    }
    let Some(cell) = obj.cell() else {
        return Ok(obj.clone());
    };
    let Some(_guard) = obj.mark_guard() else {
        warn!("Cycle detected during deep copy");
        return Err(PdfError::CycleDetected);
    };
    let value = cell.value.borrow();
    let copy = match &*value {
        Value::Int(i) => Obj::new_int(*i),
        Value::Real(r) => Obj::new_real(*r),
        Value::String(PdfString { bytes, hex: true }) => Obj::new_hex_string(bytes),
        Value::String(PdfString { bytes, hex: false }) => Obj::new_string(bytes),
        Value::Name(_) | Value::Indirect(_) => obj.clone(),
        Value::Array(ArrayData { doc, items }) => {
            let mut copied = Vec::with_capacity(items.len());
            for item in items {
                copied.push(deep_copy_at(item, depth + 1, limits)?);
            }
            let copy = Obj::new_array(doc.as_ref(), 0);
            if let Some(mut v) = copy.value_mut() {
                if let Value::Array(dst) = &mut *v {
                    dst.items = copied;
                }
            }
            copy
        }
        Value::Dict(DictData { doc, entries, sorted }) => {
            let mut copied = Vec::with_capacity(entries.len());
            for (key, item) in entries {
                copied.push((key.clone(), deep_copy_at(item, depth + 1, limits)?));
            }
            let copy = Obj::new_dict(doc.as_ref(), 0);
            if let Some(mut v) = copy.value_mut() {
                if let Value::Dict(dst) = &mut *v {
                    dst.entries = copied;
                    dst.sorted = *sorted;
                }
            }
            copy
        }
    };
    Ok(copy)
}

/// Bookkeeping before a container is mutated.
///
/// Rejects values bound to another document, stamps the incoming value with
/// the container's parent number, sets the container dirty and tells the
/// bound document which indirect object now needs rewriting.
pub(crate) fn prepare_for_alteration(container: &Obj, value: Option<&Obj>) -> PdfResult<()> {
    let doc = container.bound_doc_ref();
    if let (Some(value), Some(doc)) = (value, doc.as_ref()) {
        if let Some(value_doc) = value.bound_doc_ref() {
            if !value_doc.same_document(doc) {
                return Err(PdfError::DocumentMismatch);
            }
        }
    }

    let parent = container.parent_num();
    if parent != 0 {
        if let Some(value) = value {
            value.set_obj_parent(parent);
        }
    }
    container.dirty();

    if parent != 0 {
        if let Some(doc) = doc.and_then(|doc| doc.upgrade()) {
            debug!("Object {} altered", parent);
            doc.object_altered(parent);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::xref::XRefTable;
    use test_log::test;

    #[test]
    fn test_mark_guard_releases_on_drop() {
        let arr = Obj::new_array(None, 0);
        {
            let guard = arr.mark_guard();
            assert!(guard.is_some());
            assert!(arr.is_marked());
            assert!(arr.mark_guard().is_none());
        }
        assert!(!arr.is_marked());
    }

    #[test]
    fn test_mark_returns_previous_state() {
        let d = Obj::new_dict(None, 0);
        assert!(!d.mark());
        assert!(d.mark());
        d.unmark();
        assert!(!d.is_marked());

        // Constants are never marked.
        assert!(!Obj::null().mark());
        assert!(!Obj::null().is_marked());
    }

    #[test]
    fn test_memo_slots_are_independent() {
        let d = Obj::new_dict(None, 0);
        assert_eq!(d.memo(MemoSlot::BlendMode), None);

        d.set_memo(MemoSlot::BlendMode, true);
        d.set_memo(MemoSlot::Operators, false);
        assert_eq!(d.memo(MemoSlot::BlendMode), Some(true));
        assert_eq!(d.memo(MemoSlot::Operators), Some(false));

        d.set_memo(MemoSlot::BlendMode, false);
        assert_eq!(d.memo(MemoSlot::BlendMode), Some(false));
        assert!(!d.is_dirty());
    }

    #[test]
    fn test_dirty_bit() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        assert!(!d.is_dirty());
        d.dict_put_int("Count", 1)?;
        assert!(d.is_dirty());
        d.clean();
        assert!(!d.is_dirty());
        Ok(())
    }

    #[test]
    fn test_set_obj_parent_skips_references() -> PdfResult<()> {
        let doc = XRefTable::new();
        let inner = Obj::new_array(None, 0);
        let outer = Obj::new_dict(None, 0);
        outer.dict_put("Kids", &inner)?;
        outer.dict_put_drop("Parent", doc.new_indirect(9, 0)?)?;

        outer.set_obj_parent(4);
        assert_eq!(outer.parent_num(), 4);
        assert_eq!(inner.parent_num(), 4);
        assert_eq!(outer.dict_get("Parent")?.parent_num(), 0);
        Ok(())
    }

    #[test]
    fn test_set_obj_parent_terminates_on_cycle() -> PdfResult<()> {
        let arr = Obj::new_array(None, 1);
        arr.array_push(&arr)?;
        arr.set_obj_parent(3);
        assert_eq!(arr.parent_num(), 3);
        // Break the cycle so the test does not leak.
        arr.array_delete(0)?;
        Ok(())
    }

    #[test]
    fn test_alteration_notifies_document() -> PdfResult<()> {
        let doc = XRefTable::new();
        let page = Obj::new_dict(Some(&doc.doc_ref()), 2);
        let resources = Obj::new_dict(Some(&doc.doc_ref()), 0);
        page.dict_put("Resources", &resources)?;
        doc.insert(5, 0, page.clone())?;
        assert!(doc.altered().is_empty());

        resources.dict_put_int("Marker", 1)?;
        assert_eq!(doc.altered(), vec![5]);

        let fresh = Obj::new_dict(None, 0);
        page.dict_put("Extra", &fresh)?;
        assert_eq!(fresh.parent_num(), 5);
        Ok(())
    }

    #[test]
    fn test_foreign_values_are_rejected() -> PdfResult<()> {
        let a = XRefTable::new();
        let b = XRefTable::new();
        let container = Obj::new_array(Some(&a.doc_ref()), 0);
        let foreign = b.new_indirect(1, 0)?;
        assert!(matches!(
            container.array_push(&foreign),
            Err(PdfError::DocumentMismatch)
        ));
        assert!(container.array_push(&a.new_indirect(1, 0)?).is_ok());
        Ok(())
    }

    #[test]
    fn test_shallow_copies_share_children() -> PdfResult<()> {
        let child = Obj::new_int(1);
        let arr = Obj::new_array(None, 0);
        arr.array_push(&child)?;
        let copy = arr.copy_array()?;
        assert!(copy.array_get(0)?.ptr_eq(&child));
        assert!(!copy.ptr_eq(&arr));

        assert!(matches!(
            Obj::new_int(3).copy_dict(),
            Err(PdfError::TypeMismatch { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_deep_copy_is_independent() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        d.dict_putp("A/B/0", &Obj::new_int(7))?;
        let copy = d.deep_copy()?;
        assert_eq!(copy, d);

        copy.dict_getp("A/B/0").set_int(8);
        assert_eq!(d.dict_getp("A/B/0").to_int(), 7);
        assert!(!d.is_marked());
        Ok(())
    }

    #[test]
    fn test_deep_copy_reports_cycles() -> PdfResult<()> {
        let arr = Obj::new_array(None, 1);
        arr.array_push(&arr)?;
        assert!(matches!(arr.deep_copy(), Err(PdfError::CycleDetected)));
        assert!(!arr.is_marked());
        arr.array_delete(0)?;
        Ok(())
    }
}
