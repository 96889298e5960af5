//! Array container
//!
//! Arrays resolve the receiver before every operation, so a reference to an
//! array can be used wherever the array itself can. Element access never
//! resolves: `array_get` hands back references as stored.

use std::mem;

use log::debug;

use crate::error::{PdfError, PdfResult};
use super::graph;
use super::name::Name;
use super::object::{ArrayData, Obj, Value};

/// Make room for one more element, at least doubling the capacity.
pub(crate) fn reserve_one<T>(items: &mut Vec<T>, what: &str) {
    if items.len() < items.capacity() {
        return;
    }
    let target = (items.capacity() * 2).max(4);
    debug!("Growing {} from {} to {} slots", what, items.capacity(), target);
    items.reserve_exact(target - items.len());
}

fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

pub(crate) fn parse_index(segment: &str) -> Option<usize> {
    if is_index_segment(segment) {
        segment.parse().ok()
    } else {
        None
    }
}

impl Obj {
    pub(crate) fn with_array<R>(&self, f: impl FnOnce(&ArrayData) -> R) -> Option<R> {
        let value = self.value()?;
        match &*value {
            Value::Array(a) => Some(f(a)),
            _ => None,
        }
    }

    fn with_array_mut<R>(&self, f: impl FnOnce(&mut ArrayData) -> R) -> PdfResult<R> {
        let found = self.type_name();
        let mut value = self
            .value_mut()
            .ok_or_else(|| PdfError::type_mismatch("array", found))?;
        match &mut *value {
            Value::Array(a) => Ok(f(a)),
            _ => Err(PdfError::type_mismatch("array", found)),
        }
    }

    /// Resolve and check the receiver is an array.
    fn target_array(&self) -> PdfResult<Obj> {
        let arr = self.resolve();
        if arr.with_array(|_| ()).is_some() {
            Ok(arr)
        } else {
            Err(PdfError::type_mismatch("array", arr.type_name()))
        }
    }

    /// Number of elements; 0 for non-arrays.
    pub fn array_len(&self) -> usize {
        self.resolve().with_array(|a| a.items.len()).unwrap_or(0)
    }

    /// Allocated slots; 0 for non-arrays.
    pub fn array_capacity(&self) -> usize {
        self.resolve().with_array(|a| a.items.capacity()).unwrap_or(0)
    }

    /// Element `index`, or null past the end. Errors on a non-array.
    pub fn array_get(&self, index: usize) -> PdfResult<Obj> {
        let arr = self.target_array()?;
        Ok(arr
            .with_array(|a| a.items.get(index).cloned())
            .flatten()
            .unwrap_or_default())
    }

    /// Replace the element at `index`.
    pub fn array_put(&self, index: usize, item: &Obj) -> PdfResult<()> {
        self.array_put_drop(index, item.clone())
    }

    /// Replace element `index`. `index == len` appends.
    pub fn array_put_drop(&self, index: usize, item: Obj) -> PdfResult<()> {
        let arr = self.target_array()?;
        let len = arr.array_len();
        if index == len {
            return arr.array_push_drop(item);
        }
        if index > len {
            return Err(PdfError::index_out_of_range(index, len));
        }
        graph::prepare_for_alteration(&arr, Some(&item))?;
        let old = arr.with_array_mut(|a| match a.items.get_mut(index) {
            Some(slot) => Ok(mem::replace(slot, item)),
            None => Err(PdfError::index_out_of_range(index, a.items.len())),
        })??;
        drop(old);
        Ok(())
    }

    /// Append an element, sharing it with the caller.
    pub fn array_push(&self, item: &Obj) -> PdfResult<()> {
        self.array_push_drop(item.clone())
    }

    /// Append an element, taking ownership of it.
    pub fn array_push_drop(&self, item: Obj) -> PdfResult<()> {
        let arr = self.target_array()?;
        graph::prepare_for_alteration(&arr, Some(&item))?;
        arr.with_array_mut(|a| {
            reserve_one(&mut a.items, "array");
            a.items.push(item);
        })
    }

    /// Insert an element before `index`; `index == len` appends.
    pub fn array_insert(&self, index: usize, item: &Obj) -> PdfResult<()> {
        self.array_insert_drop(index, item.clone())
    }

    /// Insert before `index`, shifting the tail up. `index == len` appends.
    pub fn array_insert_drop(&self, index: usize, item: Obj) -> PdfResult<()> {
        let arr = self.target_array()?;
        let len = arr.array_len();
        if index > len {
            return Err(PdfError::index_out_of_range(index, len));
        }
        graph::prepare_for_alteration(&arr, Some(&item))?;
        arr.with_array_mut(|a| {
            if index > a.items.len() {
                return Err(PdfError::index_out_of_range(index, a.items.len()));
            }
            reserve_one(&mut a.items, "array");
            a.items.insert(index, item);
            Ok(())
        })?
    }

    /// Remove element `index`, shifting the tail down. Capacity is kept.
    pub fn array_delete(&self, index: usize) -> PdfResult<()> {
        let arr = self.target_array()?;
        let len = arr.array_len();
        if index >= len {
            return Err(PdfError::index_out_of_range(index, len));
        }
        graph::prepare_for_alteration(&arr, None)?;
        let old = arr.with_array_mut(|a| {
            if index < a.items.len() {
                Some(a.items.remove(index))
            } else {
                None
            }
        })?;
        drop(old);
        Ok(())
    }

    /// Index of the first element structurally equal to `item`.
    pub fn array_find(&self, item: &Obj) -> Option<usize> {
        self.resolve()
            .with_array(|a| a.items.iter().position(|x| x.compare(item).is_equal()))
            .flatten()
    }

    /// Whether any element compares equal to `item`.
    pub fn array_contains(&self, item: &Obj) -> bool {
        self.array_find(item).is_some()
    }

    // ---- typed convenience -------------------------------------------------

    /// Append a boolean.
    pub fn array_push_bool(&self, b: bool) -> PdfResult<()> {
        self.array_push_drop(Obj::bool(b))
    }

    /// Append an integer.
    pub fn array_push_int(&self, i: i64) -> PdfResult<()> {
        self.array_push_drop(Obj::new_int(i))
    }

    /// Append a real number.
    pub fn array_push_real(&self, f: f32) -> PdfResult<()> {
        self.array_push_drop(Obj::new_real(f))
    }

    /// Append a name.
    pub fn array_push_name(&self, name: &str) -> PdfResult<()> {
        self.array_push_drop(Obj::new_name(name))
    }

    /// Append a literal string.
    pub fn array_push_string(&self, bytes: &[u8]) -> PdfResult<()> {
        self.array_push_drop(Obj::new_string(bytes))
    }

    /// Append a text string, PDFDocEncoded when possible.
    pub fn array_push_text_string(&self, text: &str) -> PdfResult<()> {
        self.array_push_drop(Obj::new_text_string(text))
    }

    /// Append a new empty array bound to the same document and return it.
    pub fn array_push_array(&self, initial_capacity: usize) -> PdfResult<Obj> {
        let arr = self.target_array()?;
        let child = Obj::new_array(arr.bound_doc_ref().as_ref(), initial_capacity);
        arr.array_push(&child)?;
        Ok(child)
    }

    /// Append a new empty dictionary bound to the same document and return it.
    pub fn array_push_dict(&self, initial_capacity: usize) -> PdfResult<Obj> {
        let arr = self.target_array()?;
        let child = Obj::new_dict(arr.bound_doc_ref().as_ref(), initial_capacity);
        arr.array_push(&child)?;
        Ok(child)
    }

    fn array_get_or_null(&self, index: usize) -> Obj {
        self.array_get(index).unwrap_or_default()
    }

    /// Boolean element, false when missing or not a boolean.
    pub fn array_get_bool(&self, index: usize) -> bool {
        self.array_get_or_null(index).to_bool()
    }

    /// Integer element, 0 when missing or not a number.
    pub fn array_get_int(&self, index: usize) -> i32 {
        self.array_get_or_null(index).to_int()
    }

    /// Real element, 0.0 when missing or not a number.
    pub fn array_get_real(&self, index: usize) -> f32 {
        self.array_get_or_null(index).to_real()
    }

    /// Name element, or the empty name.
    pub fn array_get_name(&self, index: usize) -> Name {
        self.array_get_or_null(index).to_name()
    }

    /// String element bytes, empty when missing or not a string.
    pub fn array_get_string(&self, index: usize) -> Vec<u8> {
        self.array_get_or_null(index).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(31)]
    #[case(32)]
    #[case(33)]
    #[case(1000)]
    fn test_push_grows(#[case] n: usize) -> PdfResult<()> {
        let arr = Obj::new_array(None, 0);
        for i in 0..n {
            arr.array_push_int(i as i64)?;
        }
        assert_eq!(arr.array_len(), n);
        assert!(arr.array_capacity() >= n);
        for i in 0..n {
            assert_eq!(arr.array_get(i)?.to_int64(), i as i64);
        }
        assert!(arr.array_get(n)?.is_null());
        Ok(())
    }

    #[test_log::test]
    fn test_growth_at_least_doubles() -> PdfResult<()> {
        let arr = Obj::new_array(None, 4);
        for i in 0..4 {
            arr.array_push_int(i)?;
        }
        let before = arr.array_capacity();
        arr.array_push_int(4)?;
        assert!(arr.array_capacity() >= before * 2);
        Ok(())
    }

    #[test_log::test]
    fn test_put_and_bounds() -> PdfResult<()> {
        let arr = Obj::new_array(None, 2);
        arr.array_push_int(1)?;
        arr.array_put(0, &Obj::new_int(9))?;
        assert_eq!(arr.array_get_int(0), 9);

        // Put at the end appends.
        arr.array_put(1, &Obj::new_int(10))?;
        assert_eq!(arr.array_len(), 2);

        assert!(matches!(
            arr.array_put(5, &Obj::null()),
            Err(PdfError::IndexOutOfRange { index: 5, len: 2 })
        ));
        assert!(arr.array_insert(3, &Obj::null()).is_err());
        assert!(arr.array_delete(2).is_err());
        Ok(())
    }

    #[test_log::test]
    fn test_insert_and_delete_shift() -> PdfResult<()> {
        let arr = Obj::new_array(None, 0);
        for i in [1, 2, 4] {
            arr.array_push_int(i)?;
        }
        arr.array_insert(2, &Obj::new_int(3))?;
        arr.array_insert(0, &Obj::new_int(0))?;
        let values: Vec<i32> = (0..arr.array_len()).map(|i| arr.array_get_int(i)).collect();
        assert_eq!(values, vec![0, 1, 2, 3, 4]);

        let cap = arr.array_capacity();
        arr.array_delete(0)?;
        arr.array_delete(3)?;
        let values: Vec<i32> = (0..arr.array_len()).map(|i| arr.array_get_int(i)).collect();
        assert_eq!(values, vec![1, 2, 3]);
        assert_eq!(arr.array_capacity(), cap);
        Ok(())
    }

    #[test_log::test]
    fn test_non_array_receiver() {
        let d = Obj::new_dict(None, 0);
        assert!(matches!(d.array_get(0), Err(PdfError::TypeMismatch { .. })));
        assert!(d.array_push_int(1).is_err());
        assert!(d.array_delete(0).is_err());
        assert_eq!(d.array_len(), 0);
        assert_eq!(d.array_get_int(0), 0);
        assert_eq!(Obj::null().array_len(), 0);
    }

    #[test_log::test]
    fn test_ownership_variants() -> PdfResult<()> {
        let arr = Obj::new_array(None, 0);
        let item = Obj::new_string(b"shared");
        arr.array_push(&item)?;
        assert_eq!(item.ref_count(), 2);

        let owned = Obj::new_string(b"owned");
        let probe = owned.keep();
        arr.array_push_drop(owned)?;
        assert_eq!(probe.ref_count(), 2);

        arr.array_delete(0)?;
        assert_eq!(item.ref_count(), 1);
        Ok(())
    }

    #[test_log::test]
    fn test_find_and_contains() -> PdfResult<()> {
        let arr = Obj::new_array(None, 0);
        arr.array_push_name("A")?;
        arr.array_push_int(2)?;
        arr.array_push_real(2.0)?;
        assert_eq!(arr.array_find(&Obj::new_real(2.0)), Some(1));
        assert_eq!(arr.array_find(&Obj::new_name("A")), Some(0));
        assert!(!arr.array_contains(&Obj::new_name("B")));
        assert_eq!(Obj::new_int(1).array_find(&Obj::new_int(1)), None);
        Ok(())
    }

    #[test_log::test]
    fn test_typed_children() -> PdfResult<()> {
        let arr = Obj::new_array(None, 0);
        let inner = arr.array_push_array(2)?;
        inner.array_push_bool(true)?;
        let dict = arr.array_push_dict(1)?;
        dict.dict_put_int("N", 3)?;
        arr.array_push_string(b"abc")?;

        assert!(arr.array_get(0)?.array_get_bool(0));
        assert_eq!(arr.array_get(1)?.dict_get_int("N"), 3);
        assert_eq!(arr.array_get_string(2), b"abc".to_vec());
        assert_eq!(arr.array_get_name(2).as_str(), "");
        Ok(())
    }

    #[test_log::test]
    fn test_mutation_marks_dirty() -> PdfResult<()> {
        let arr = Obj::new_array(None, 0);
        arr.array_push_int(1)?;
        assert!(arr.is_dirty());
        arr.clean();
        arr.array_delete(0)?;
        assert!(arr.is_dirty());
        Ok(())
    }
}
