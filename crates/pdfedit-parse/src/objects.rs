//! Small helpers for reading lopdf objects.

use lopdf::{Dictionary, Document, Object};

/// Resolve an indirect reference to the actual object.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Convert a lopdf object to f64, returning None if not a number.
pub(crate) fn to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

/// Look up `key` in `dict`, following a reference.
pub(crate) fn get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

pub(crate) fn get_f64(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f64> {
    get(doc, dict, key).and_then(to_f64)
}

pub(crate) fn get_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    get(doc, dict, key).and_then(|obj| obj.as_dict().ok())
}

pub(crate) fn get_name<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    get(doc, dict, key).and_then(|obj| obj.as_name().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn numbers_and_references() {
        let mut doc = Document::with_version("1.5");
        let width_id = doc.add_object(Object::Integer(612));
        let dict = dictionary! {
            "W" => Object::Reference(width_id),
            "H" => Object::Real(792.5),
            "Box" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(10.5),
                Object::Integer(20),
            ],
            "Name" => Object::Name(b"DeviceRGB".to_vec()),
        };
        assert_eq!(get_f64(&doc, &dict, b"W"), Some(612.0));
        assert_eq!(get_f64(&doc, &dict, b"H"), Some(792.5));
        assert_eq!(get_f64(&doc, &dict, b"Missing"), None);
        assert_eq!(get_name(&doc, &dict, b"Name"), Some(&b"DeviceRGB"[..]));
        assert_eq!(get_name(&doc, &dict, b"W"), None);
    }
}
