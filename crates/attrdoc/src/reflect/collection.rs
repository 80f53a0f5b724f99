use super::{FromAttr, Marshaler, Slot, ToAttr};
use crate::{AttrType, Path, Step, Value, WireType};
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

impl<T: FromAttr> FromAttr for Option<T> {
    fn from_attr(m: &mut Marshaler<'_>, ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        if value.is_null() {
            return Some(None);
        }
        if value.is_unknown() && !T::accepts_unknown() {
            if m.options().unhandled_unknown_as_empty {
                return Some(None);
            }
            m.error(path, "unhandled unknown value: Option cannot represent unknown");
            return None;
        }
        T::from_attr(m, ty, value, path).map(Some)
    }

    fn accepts_unknown() -> bool {
        T::accepts_unknown()
    }
}

impl<T: ToAttr> ToAttr for Option<T> {
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        match self {
            Some(v) => v.to_attr(m, ty, path),
            None => Some(Value::null(ty.wire_type())),
        }
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

impl<T: FromAttr> FromAttr for Box<T> {
    fn from_attr(m: &mut Marshaler<'_>, ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        T::from_attr(m, ty, value, path).map(Box::new)
    }

    fn accepts_unknown() -> bool {
        T::accepts_unknown()
    }
}

impl<T: ToAttr + ?Sized> ToAttr for Box<T> {
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        (**self).to_attr(m, ty, path)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: ToAttr + ?Sized> ToAttr for &T {
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        (**self).to_attr(m, ty, path)
    }

    fn is_absent(&self) -> bool {
        (**self).is_absent()
    }
}

impl<T: FromAttr> FromAttr for Vec<T> {
    fn from_attr(m: &mut Marshaler<'_>, ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        let is_sequence = |t: &WireType| matches!(t, WireType::List(_) | WireType::Set(_));
        let v = match m.known(value, path, "Vec", is_sequence)? {
            Slot::Known(v) => v,
            Slot::Empty => return Some(Vec::new()),
        };
        let (elems, is_set) = match (v.as_list(), v.as_set()) {
            (Some(list), _) => (list, false),
            (None, Some(set)) => (set, true),
            (None, None) => (&[][..], false),
        };

        let mut out = Vec::with_capacity(elems.len());
        let mut failed = false;
        for (i, elem) in elems.iter().enumerate() {
            let step = if is_set {
                Step::element(elem.clone())
            } else {
                Step::index(i)
            };
            let Some(elem_ty) = m.child_type(ty, &step, path) else {
                failed = true;
                continue;
            };
            match m.decode::<T>(elem_ty.as_ref(), elem, &path.with_step(step)) {
                Some(decoded) => out.push(decoded),
                None => failed = true,
            }
        }
        (!failed).then_some(out)
    }
}

impl<T: ToAttr> ToAttr for [T] {
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        let wire = ty.wire_type();
        let (elem_wire, is_set) = match &wire {
            WireType::List(e) => ((**e).clone(), false),
            WireType::Set(e) => ((**e).clone(), true),
            other => {
                m.error(path, format!("cannot encode a sequence as {}", other));
                return None;
            }
        };

        let mut elems = Vec::with_capacity(self.len());
        let mut failed = false;
        for (i, item) in self.iter().enumerate() {
            let probe = if is_set {
                Step::element(Value::null(elem_wire.clone()))
            } else {
                Step::index(i)
            };
            let Some(elem_ty) = m.child_type(ty, &probe, path) else {
                failed = true;
                continue;
            };
            let Some(encoded) = m.encode_unvalidated(item, elem_ty.as_ref(), &path.index(i)) else {
                failed = true;
                continue;
            };
            let elem_path = if is_set {
                path.element(encoded.clone())
            } else {
                path.index(i)
            };
            if m.validate(elem_ty.as_ref(), &encoded, &elem_path) {
                elems.push(encoded);
            } else {
                failed = true;
            }
        }
        if failed {
            return None;
        }

        let built = if is_set {
            Value::set(elem_wire, elems)
        } else {
            Value::list(elem_wire, elems)
        };
        match built {
            Ok(v) => Some(v),
            Err(err) => {
                m.error(path, err.with_prefix(path));
                None
            }
        }
    }
}

impl<T: ToAttr> ToAttr for Vec<T> {
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        self.as_slice().to_attr(m, ty, path)
    }
}

fn decode_entries<T: FromAttr>(
    m: &mut Marshaler<'_>,
    ty: &dyn AttrType,
    value: &Value,
    path: &Path,
    target: &str,
) -> Option<Vec<(String, T)>> {
    let v = match m.known(value, path, target, |t| matches!(t, WireType::Map(_)))? {
        Slot::Known(v) => v,
        Slot::Empty => return Some(Vec::new()),
    };
    let mut out = Vec::new();
    let mut failed = false;
    for (key, elem) in v.as_map().into_iter().flatten() {
        let step = Step::key(key.as_str());
        let Some(elem_ty) = m.child_type(ty, &step, path) else {
            failed = true;
            continue;
        };
        match m.decode::<T>(elem_ty.as_ref(), elem, &path.with_step(step)) {
            Some(decoded) => out.push((key.clone(), decoded)),
            None => failed = true,
        }
    }
    (!failed).then_some(out)
}

fn encode_entries<'a, T: ToAttr + 'a>(
    m: &mut Marshaler<'_>,
    ty: &dyn AttrType,
    path: &Path,
    entries: impl Iterator<Item = (&'a String, &'a T)>,
) -> Option<Value> {
    let wire = ty.wire_type();
    let Some(elem_wire) = (match &wire {
        WireType::Map(e) => Some((**e).clone()),
        _ => None,
    }) else {
        m.error(path, format!("cannot encode a map as {}", wire));
        return None;
    };

    let mut out = BTreeMap::new();
    let mut failed = false;
    for (key, item) in entries {
        let step = Step::key(key.as_str());
        let Some(elem_ty) = m.child_type(ty, &step, path) else {
            failed = true;
            continue;
        };
        match m.encode(item, elem_ty.as_ref(), &path.with_step(step)) {
            Some(encoded) => {
                out.insert(key.clone(), encoded);
            }
            None => failed = true,
        }
    }
    if failed {
        return None;
    }
    match Value::map(elem_wire, out) {
        Ok(v) => Some(v),
        Err(err) => {
            m.error(path, err.with_prefix(path));
            None
        }
    }
}

impl<T: FromAttr> FromAttr for BTreeMap<String, T> {
    fn from_attr(m: &mut Marshaler<'_>, ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        decode_entries(m, ty, value, path, "BTreeMap").map(|e| e.into_iter().collect())
    }
}

impl<T: ToAttr> ToAttr for BTreeMap<String, T> {
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        encode_entries(m, ty, path, self.iter())
    }
}

impl<T: FromAttr, S: BuildHasher + Default> FromAttr for HashMap<String, T, S> {
    fn from_attr(m: &mut Marshaler<'_>, ty: &dyn AttrType, value: &Value, path: &Path) -> Option<Self> {
        decode_entries(m, ty, value, path, "HashMap").map(|e| e.into_iter().collect())
    }
}

impl<T: ToAttr, S: BuildHasher> ToAttr for HashMap<String, T, S> {
    fn to_attr(&self, m: &mut Marshaler<'_>, ty: &dyn AttrType, path: &Path) -> Option<Value> {
        encode_entries(m, ty, path, self.iter())
    }
}
