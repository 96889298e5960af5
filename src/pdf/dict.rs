//! Dictionary container
//!
//! Entries keep insertion order, which is the order they serialize in. Lookup
//! is a linear scan until the dictionary is sorted; after `dict_sort` new keys
//! are inserted in place and lookup switches to binary search.

use std::mem;

use log::trace;

use crate::error::{PdfError, PdfResult};
use super::array::{parse_index, reserve_one};
use super::geometry::{Matrix, Rect};
use super::graph;
use super::name::{KnownName, Name};
use super::object::{DictData, Obj, ObjKind, Value};

/// Anything usable as a dictionary key.
pub trait DictKey {
    /// The key as a name, or `None` if it is not a name.
    fn dict_key(&self) -> Option<Name>;
}

impl DictKey for str {
    fn dict_key(&self) -> Option<Name> {
        Some(Name::new(self))
    }
}

impl DictKey for String {
    fn dict_key(&self) -> Option<Name> {
        Some(Name::new(self))
    }
}

impl DictKey for KnownName {
    fn dict_key(&self) -> Option<Name> {
        Some(Name::Known(*self))
    }
}

impl DictKey for Name {
    fn dict_key(&self) -> Option<Name> {
        Some(self.clone())
    }
}

impl DictKey for Obj {
    fn dict_key(&self) -> Option<Name> {
        if self.is_name() {
            Some(self.to_name())
        } else {
            None
        }
    }
}

impl<T: DictKey + ?Sized> DictKey for &T {
    fn dict_key(&self) -> Option<Name> {
        (**self).dict_key()
    }
}

impl DictData {
    pub(crate) fn find(&self, key: &Name) -> Option<usize> {
        if self.sorted {
            self.entries.binary_search_by(|(k, _)| k.cmp(key)).ok()
        } else {
            self.entries.iter().position(|(k, _)| k == key)
        }
    }

    pub(crate) fn lookup(&self, key: &Name) -> Option<&Obj> {
        self.find(key).map(|idx| &self.entries[idx].1)
    }

    /// Find-or-insert. Returns the value previously stored under `key`.
    fn insert(&mut self, key: Name, value: Obj) -> Option<Obj> {
        let slot = if self.sorted {
            self.entries.binary_search_by(|(k, _)| k.cmp(&key))
        } else {
            self.entries
                .iter()
                .position(|(k, _)| *k == key)
                .ok_or(self.entries.len())
        };
        match slot {
            Ok(idx) => Some(mem::replace(&mut self.entries[idx].1, value)),
            Err(idx) => {
                reserve_one(&mut self.entries, "dictionary");
                self.entries.insert(idx, (key, value));
                None
            }
        }
    }

    fn remove(&mut self, key: &Name) -> Option<(Name, Obj)> {
        self.find(key).map(|idx| self.entries.remove(idx))
    }
}

fn key_name<K: DictKey>(key: K) -> PdfResult<Name> {
    key.dict_key()
        .ok_or_else(|| PdfError::type_mismatch("name", "non-name key"))
}

fn split_path(path: &str) -> PdfResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').collect();
    if path.is_empty() || segments.iter().any(|s| s.is_empty()) {
        return Err(PdfError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

/// A step in a dictionary path.
enum Step<'a> {
    Key(Name),
    Index(usize, &'a str),
}

impl Obj {
    pub(crate) fn with_dict<R>(&self, f: impl FnOnce(&DictData) -> R) -> Option<R> {
        let value = self.value()?;
        match &*value {
            Value::Dict(d) => Some(f(d)),
            _ => None,
        }
    }

    fn with_dict_mut<R>(&self, f: impl FnOnce(&mut DictData) -> R) -> PdfResult<R> {
        let found = self.type_name();
        let mut value = self
            .value_mut()
            .ok_or_else(|| PdfError::type_mismatch("dictionary", found))?;
        match &mut *value {
            Value::Dict(d) => Ok(f(d)),
            _ => Err(PdfError::type_mismatch("dictionary", found)),
        }
    }

    fn target_dict(&self) -> PdfResult<Obj> {
        let dict = self.resolve();
        if dict.kind() == ObjKind::Dict {
            Ok(dict)
        } else {
            Err(PdfError::type_mismatch("dictionary", dict.type_name()))
        }
    }

    /// Number of entries; 0 for non-dictionaries.
    pub fn dict_len(&self) -> usize {
        self.resolve().with_dict(|d| d.entries.len()).unwrap_or(0)
    }

    /// Whether `dict_sort` has been applied.
    pub fn dict_is_sorted(&self) -> bool {
        self.resolve().with_dict(|d| d.sorted).unwrap_or(false)
    }

    /// Value stored under `key`, or null. Errors on a non-dictionary.
    pub fn dict_get<K: DictKey>(&self, key: K) -> PdfResult<Obj> {
        let dict = self.target_dict()?;
        let Some(key) = key.dict_key() else {
            return Ok(Obj::null());
        };
        Ok(dict
            .with_dict(|d| d.lookup(&key).cloned())
            .flatten()
            .unwrap_or_default())
    }

    /// Look up `key`, falling back to the abbreviated form `abbrev`.
    pub fn dict_geta<K: DictKey, A: DictKey>(&self, key: K, abbrev: A) -> PdfResult<Obj> {
        let value = self.dict_get(key)?;
        if value.kind() != ObjKind::Null {
            return Ok(value);
        }
        self.dict_get(abbrev)
    }

    /// Key of entry `index` as a name object, or null.
    pub fn dict_get_key(&self, index: usize) -> Obj {
        self.resolve()
            .with_dict(|d| d.entries.get(index).map(|(k, _)| Obj::from_name(k)))
            .flatten()
            .unwrap_or_default()
    }

    /// Value of entry `index`, or null.
    pub fn dict_get_val(&self, index: usize) -> Obj {
        self.resolve()
            .with_dict(|d| d.entries.get(index).map(|(_, v)| v.clone()))
            .flatten()
            .unwrap_or_default()
    }

    /// Follow a `/`-separated path. Numeric segments index into arrays.
    ///
    /// Any missing step yields null.
    pub fn dict_getp(&self, path: &str) -> Obj {
        let Ok(segments) = split_path(path) else {
            return Obj::null();
        };
        let mut current = self.clone();
        for segment in segments {
            let node = current.resolve();
            current = match (node.kind(), parse_index(segment)) {
                (ObjKind::Array, Some(idx)) => node.array_get(idx).unwrap_or_default(),
                (ObjKind::Dict, _) => node.dict_get(segment).unwrap_or_default(),
                _ => return Obj::null(),
            };
        }
        current
    }

    /// Follow a sequence of keys through nested dictionaries.
    pub fn dict_getl<K: DictKey>(&self, keys: &[K]) -> Obj {
        let mut current = self.clone();
        for key in keys {
            current = match current.dict_get(key) {
                Ok(next) => next,
                Err(_) => return Obj::null(),
            };
        }
        current
    }

    /// Store `value` under `key`, sharing it with the caller.
    pub fn dict_put<K: DictKey>(&self, key: K, value: &Obj) -> PdfResult<()> {
        self.dict_put_drop(key, value.clone())
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn dict_put_drop<K: DictKey>(&self, key: K, value: Obj) -> PdfResult<()> {
        let old = self.dict_get_put_drop(key, value)?;
        drop(old);
        Ok(())
    }

    /// Store `value` under `key` and hand back the value it replaced (null
    /// when the key is new).
    pub fn dict_get_put_drop<K: DictKey>(&self, key: K, value: Obj) -> PdfResult<Obj> {
        let dict = self.target_dict()?;
        let key = key_name(key)?;
        graph::prepare_for_alteration(&dict, Some(&value))?;
        trace!("Putting /{} into dictionary", key);
        let old = dict.with_dict_mut(|d| d.insert(key, value))?;
        Ok(old.unwrap_or_default())
    }

    /// Remove `key` if present.
    pub fn dict_del<K: DictKey>(&self, key: K) -> PdfResult<()> {
        let dict = self.target_dict()?;
        let key = key_name(key)?;
        if dict.with_dict(|d| d.find(&key).is_none()).unwrap_or(true) {
            return Ok(());
        }
        graph::prepare_for_alteration(&dict, None)?;
        let old = dict.with_dict_mut(|d| d.remove(&key))?;
        drop(old);
        Ok(())
    }

    /// Reorder entries bytewise by key.
    pub fn dict_sort(&self) -> PdfResult<()> {
        let dict = self.target_dict()?;
        dict.with_dict_mut(|d| {
            if !d.sorted {
                d.entries.sort_by(|a, b| a.0.cmp(&b.0));
                d.sorted = true;
            }
        })
    }

    /// Store `value` at a `/`-separated path, creating missing dictionaries.
    pub fn dict_putp(&self, path: &str, value: &Obj) -> PdfResult<()> {
        self.dict_putp_drop(path, value.clone())
    }

    /// Store `value` at a `/`-separated path, creating missing intermediate
    /// containers: an array when the following segment is numeric, a
    /// dictionary otherwise. Array slots can be replaced or appended, never
    /// skipped.
    pub fn dict_putp_drop(&self, path: &str, value: Obj) -> PdfResult<()> {
        let segments = split_path(path)?;
        let steps: Vec<Step<'_>> = segments
            .iter()
            .map(|&segment| match parse_index(segment) {
                Some(idx) => Step::Index(idx, segment),
                None => Step::Key(Name::new(segment)),
            })
            .collect();
        self.target_dict()?;
        self.put_steps(&steps, value, path)
    }

    /// Store `value` under a key sequence.
    pub fn dict_putl<K: DictKey>(&self, keys: &[K], value: &Obj) -> PdfResult<()> {
        self.dict_putl_drop(keys, value.clone())
    }

    /// Store `value` under a key sequence, creating missing dictionaries.
    pub fn dict_putl_drop<K: DictKey>(&self, keys: &[K], value: Obj) -> PdfResult<()> {
        if keys.is_empty() {
            return Err(PdfError::InvalidPath(String::new()));
        }
        let steps = keys
            .iter()
            .map(|key| key_name(key).map(Step::Key))
            .collect::<PdfResult<Vec<_>>>()?;
        self.target_dict()?;
        let shown = steps
            .iter()
            .map(|step| match step {
                Step::Key(name) => name.as_str().to_string(),
                Step::Index(_, text) => text.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/");
        self.put_steps(&steps, value, &shown)
    }

    fn put_steps(&self, steps: &[Step<'_>], value: Obj, path: &str) -> PdfResult<()> {
        let Some((last, parents)) = steps.split_last() else {
            return Err(PdfError::InvalidPath(path.to_string()));
        };
        let mut node = self.resolve();
        for (pos, step) in parents.iter().enumerate() {
            let next_is_index = matches!(steps[pos + 1], Step::Index(..));
            node = node.child_for_path(step, next_is_index, path)?.resolve();
        }
        node.put_step(last, value, path)
    }

    fn child_for_path(&self, step: &Step<'_>, next_is_index: bool, path: &str) -> PdfResult<Obj> {
        let existing = self.step_get(step, path)?;
        if existing.kind() != ObjKind::Null {
            return Ok(existing);
        }
        let doc = self.bound_doc_ref();
        let child = if next_is_index {
            Obj::new_array(doc.as_ref(), 1)
        } else {
            Obj::new_dict(doc.as_ref(), 1)
        };
        self.put_step(step, child.clone(), path)?;
        Ok(child)
    }

    fn step_get(&self, step: &Step<'_>, path: &str) -> PdfResult<Obj> {
        match (self.kind(), step) {
            (ObjKind::Dict, Step::Key(name)) => self.dict_get(name),
            (ObjKind::Dict, Step::Index(_, text)) => self.dict_get(*text),
            (ObjKind::Array, Step::Index(idx, _)) => self.array_get(*idx),
            _ => Err(PdfError::InvalidPath(path.to_string())),
        }
    }

    fn put_step(&self, step: &Step<'_>, value: Obj, path: &str) -> PdfResult<()> {
        match (self.kind(), step) {
            (ObjKind::Dict, Step::Key(name)) => self.dict_put_drop(name, value),
            (ObjKind::Dict, Step::Index(_, text)) => self.dict_put_drop(*text, value),
            (ObjKind::Array, Step::Index(idx, _)) => self.array_put_drop(*idx, value),
            _ => Err(PdfError::InvalidPath(path.to_string())),
        }
    }

    // ---- typed puts ------------------------------------------------------

    /// Store a boolean.
    pub fn dict_put_bool<K: DictKey>(&self, key: K, b: bool) -> PdfResult<()> {
        self.dict_put_drop(key, Obj::bool(b))
    }

    /// Store an integer.
    pub fn dict_put_int<K: DictKey>(&self, key: K, i: i64) -> PdfResult<()> {
        self.dict_put_drop(key, Obj::new_int(i))
    }

    /// Store a real number.
    pub fn dict_put_real<K: DictKey>(&self, key: K, f: f32) -> PdfResult<()> {
        self.dict_put_drop(key, Obj::new_real(f))
    }

    /// Store a name.
    pub fn dict_put_name<K: DictKey>(&self, key: K, name: &str) -> PdfResult<()> {
        self.dict_put_drop(key, Obj::new_name(name))
    }

    /// Store a literal string.
    pub fn dict_put_string<K: DictKey>(&self, key: K, bytes: &[u8]) -> PdfResult<()> {
        self.dict_put_drop(key, Obj::new_string(bytes))
    }

    /// Store a text string, PDFDocEncoded when possible.
    pub fn dict_put_text_string<K: DictKey>(&self, key: K, text: &str) -> PdfResult<()> {
        self.dict_put_drop(key, Obj::new_text_string(text))
    }

    /// Store a rectangle as a four-number array.
    pub fn dict_put_rect<K: DictKey>(&self, key: K, rect: Rect) -> PdfResult<()> {
        let doc = self.resolve().bound_doc_ref();
        self.dict_put_drop(key, Obj::new_rect(doc.as_ref(), rect))
    }

    /// Store a matrix as a six-number array.
    pub fn dict_put_matrix<K: DictKey>(&self, key: K, matrix: Matrix) -> PdfResult<()> {
        let doc = self.resolve().bound_doc_ref();
        self.dict_put_drop(key, Obj::new_matrix(doc.as_ref(), matrix))
    }

    /// Store a new empty array under `key` and return it for filling.
    pub fn dict_put_array<K: DictKey>(&self, key: K, initial_capacity: usize) -> PdfResult<Obj> {
        let dict = self.target_dict()?;
        let child = Obj::new_array(dict.bound_doc_ref().as_ref(), initial_capacity);
        dict.dict_put(key, &child)?;
        Ok(child)
    }

    /// Store a new empty dictionary under `key` and return it for filling.
    pub fn dict_put_dict<K: DictKey>(&self, key: K, initial_capacity: usize) -> PdfResult<Obj> {
        let dict = self.target_dict()?;
        let child = Obj::new_dict(dict.bound_doc_ref().as_ref(), initial_capacity);
        dict.dict_put(key, &child)?;
        Ok(child)
    }

    // ---- typed gets ------------------------------------------------------

    fn dict_get_or_null<K: DictKey>(&self, key: K) -> Obj {
        self.dict_get(key).unwrap_or_default()
    }

    /// Boolean value, false when missing or not a boolean.
    pub fn dict_get_bool<K: DictKey>(&self, key: K) -> bool {
        self.dict_get_or_null(key).to_bool()
    }

    /// Integer value, 0 when missing or not a number.
    pub fn dict_get_int<K: DictKey>(&self, key: K) -> i32 {
        self.dict_get_or_null(key).to_int()
    }

    /// 64-bit integer value, 0 when missing or not a number.
    pub fn dict_get_int64<K: DictKey>(&self, key: K) -> i64 {
        self.dict_get_or_null(key).to_int64()
    }

    /// Real value, 0.0 when missing or not a number.
    pub fn dict_get_real<K: DictKey>(&self, key: K) -> f32 {
        self.dict_get_or_null(key).to_real()
    }

    /// Name value, or the empty name.
    pub fn dict_get_name<K: DictKey>(&self, key: K) -> Name {
        self.dict_get_or_null(key).to_name()
    }

    /// String bytes, empty when missing or not a string.
    pub fn dict_get_string<K: DictKey>(&self, key: K) -> Vec<u8> {
        self.dict_get_or_null(key).to_bytes()
    }

    /// Decoded text string, empty when missing.
    pub fn dict_get_text_string<K: DictKey>(&self, key: K) -> String {
        self.dict_get_or_null(key).to_utf8()
    }

    /// Rectangle value, empty when missing.
    pub fn dict_get_rect<K: DictKey>(&self, key: K) -> Rect {
        self.dict_get_or_null(key).to_rect()
    }

    /// Matrix value, identity when missing.
    pub fn dict_get_matrix<K: DictKey>(&self, key: K) -> Matrix {
        self.dict_get_or_null(key).to_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_log::test;

    fn keys(dict: &Obj) -> Vec<String> {
        (0..dict.dict_len())
            .map(|i| dict.dict_get_key(i).to_name().as_str().to_string())
            .collect()
    }

    #[test]
    fn test_put_overwrites() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        d.dict_put("A", &Obj::new_int(1))?;
        d.dict_put("A", &Obj::new_int(2))?;
        assert_eq!(d.dict_get("A")?.to_int(), 2);
        assert_eq!(d.dict_len(), 1);
        Ok(())
    }

    #[test]
    fn test_insertion_order_preserved() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        d.dict_put_name(KnownName::Type, "Page")?;
        d.dict_put_int("Zed", 1)?;
        d.dict_put_int("Alpha", 2)?;
        assert_eq!(keys(&d), vec!["Type", "Zed", "Alpha"]);
        assert_eq!(d.dict_get_val(1).to_int(), 1);
        assert!(d.dict_get_key(9).is_null());
        Ok(())
    }

    #[test]
    fn test_key_kinds_agree() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        d.dict_put(KnownName::Length, &Obj::new_int(10))?;
        assert_eq!(d.dict_get_int("Length"), 10);
        assert_eq!(d.dict_get_int(Obj::new_name("Length")), 10);
        assert_eq!(d.dict_get_int(Name::new("Length")), 10);
        assert_eq!(d.dict_get_int(String::from("Length")), 10);

        // A non-name key reads as absent and cannot be written.
        assert!(d.dict_get(Obj::new_int(1))?.is_null());
        assert!(d.dict_put(Obj::new_int(1), &Obj::null()).is_err());
        Ok(())
    }

    #[test]
    fn test_abbreviation_fallback() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        d.dict_put_name("F", "FlateDecode")?;
        assert_eq!(d.dict_geta("Filter", "F")?.to_name().as_str(), "FlateDecode");
        d.dict_put_name("Filter", "DCTDecode")?;
        assert_eq!(d.dict_geta("Filter", "F")?.to_name().as_str(), "DCTDecode");
        Ok(())
    }

    #[test]
    fn test_get_put_drop_returns_previous() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        assert!(d.dict_get_put_drop("K", Obj::new_int(1))?.is_null());
        let old = d.dict_get_put_drop("K", Obj::new_int(2))?;
        assert_eq!(old.to_int(), 1);
        assert_eq!(old.ref_count(), 1);
        Ok(())
    }

    #[test]
    fn test_delete() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        d.dict_put_int("A", 1)?;
        d.dict_put_int("B", 2)?;
        d.dict_del("A")?;
        d.dict_del("Missing")?;
        assert_eq!(keys(&d), vec!["B"]);
        Ok(())
    }

    #[test]
    fn test_sort_and_sorted_insert() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        for key in ["b", "Type", "A", "ca"] {
            d.dict_put_int(key, 1)?;
        }
        d.dict_sort()?;
        assert!(d.dict_is_sorted());
        assert_eq!(keys(&d), vec!["A", "Type", "b", "ca"]);

        d.dict_put_int("Length", 4)?;
        assert_eq!(keys(&d), vec!["A", "Length", "Type", "b", "ca"]);
        assert_eq!(d.dict_get_int("Length"), 4);
        assert_eq!(d.dict_get_int("ca"), 1);
        Ok(())
    }

    #[test]
    fn test_path_put_creates_containers() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        let val = Obj::new_string(b"leaf");
        d.dict_putp("A/B/0", &val)?;

        let b = d.dict_get("A")?.dict_get("B")?;
        assert!(b.is_array());
        assert_eq!(b.array_len(), 1);
        assert!(d.dict_getp("A/B/0").compare(&val).is_equal());

        // Extending the array by one is fine, skipping slots is not.
        d.dict_putp("A/B/1", &Obj::new_int(1))?;
        assert!(matches!(
            d.dict_putp("A/B/5", &Obj::new_int(5)),
            Err(PdfError::IndexOutOfRange { index: 5, len: 2 })
        ));
        Ok(())
    }

    #[test]
    fn test_path_errors() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        d.dict_put_int("N", 1)?;
        assert!(matches!(d.dict_putp("", &Obj::null()), Err(PdfError::InvalidPath(_))));
        assert!(matches!(d.dict_putp("A//B", &Obj::null()), Err(PdfError::InvalidPath(_))));
        assert!(matches!(d.dict_putp("N/X", &Obj::null()), Err(PdfError::InvalidPath(_))));
        assert!(d.dict_getp("Missing/Deeper").is_null());
        assert!(d.dict_getp("N/0").is_null());
        Ok(())
    }

    #[test]
    fn test_key_list_put_and_get() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        d.dict_putl(&["Root", "Pages", "Count"], &Obj::new_int(3))?;
        assert_eq!(d.dict_getl(&["Root", "Pages", "Count"]).to_int(), 3);
        assert!(d.dict_getl(&["Root", "Nope", "Count"]).is_null());
        assert!(d.dict_putl::<&str>(&[], &Obj::null()).is_err());
        Ok(())
    }

    #[test]
    fn test_non_dict_receiver() {
        let a = Obj::new_array(None, 0);
        assert!(matches!(a.dict_get("A"), Err(PdfError::TypeMismatch { .. })));
        assert!(a.dict_put_int("A", 1).is_err());
        assert!(a.dict_del("A").is_err());
        assert_eq!(a.dict_len(), 0);
        assert_eq!(a.dict_get_int("A"), 0);
        assert!(a.dict_get_val(0).is_null());
        assert!(a.dict_getp("A").is_null());
    }

    #[test]
    fn test_typed_round_trip() -> PdfResult<()> {
        let d = Obj::new_dict(None, 0);
        d.dict_put_bool("B", true)?;
        d.dict_put_real("R", 0.5)?;
        d.dict_put_string("S", b"bytes")?;
        d.dict_put_text_string("T", "caf\u{e9}")?;
        d.dict_put_rect("MediaBox", Rect::new(0.0, 0.0, 612.0, 792.0))?;
        let kids = d.dict_put_array("Kids", 1)?;
        kids.array_push_int(1)?;
        let res = d.dict_put_dict("Resources", 0)?;
        res.dict_put_name("ProcSet", "PDF")?;

        assert!(d.dict_get_bool("B"));
        assert_eq!(d.dict_get_real("R"), 0.5);
        assert_eq!(d.dict_get_string("S"), b"bytes".to_vec());
        assert_eq!(d.dict_get_text_string("T"), "caf\u{e9}");
        assert_eq!(d.dict_get_rect("MediaBox").x1, 612.0);
        assert_eq!(d.dict_getp("Kids/0").to_int(), 1);
        assert_eq!(d.dict_getp("Resources/ProcSet").to_name().as_str(), "PDF");
        Ok(())
    }
}
