//! Dotted property path resolution.
//!
//! A path such as `"address.city"` is resolved against a live record: every
//! segment but the last must name a nested-record field, whose current value
//! becomes the owner for the rest of the path. The last segment names the
//! terminal field.

use crate::error::{Result, SheetError};
use crate::field::{find_field, FieldDescriptor};
use crate::traits::Record;
use crate::value::FieldValue;

/// Splits a path into its first segment and the remainder after the first dot.
pub fn split_head(path: &str) -> (&str, Option<&str>) {
    match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}

/// Resolves `path` against `root`, returning the record that owns the terminal
/// field together with that field's descriptor.
///
/// A single-segment path resolves to `(root, descriptor)` after one lookup.
/// Fails with [`SheetError::FieldNotFound`] when a segment does not name a
/// field, or when an intermediate segment is not a present nested record.
///
/// ```
/// use sheetmap::{resolve_path, Record};
///
/// #[derive(Record)]
/// struct Address {
///     city: String,
/// }
///
/// #[derive(Record)]
/// struct Person {
///     name: String,
///     address: Address,
/// }
///
/// let person = Person {
///     name: "Ann".into(),
///     address: Address { city: "Oslo".into() },
/// };
///
/// let (owner, field) = resolve_path(&person, "address.city").unwrap();
/// assert_eq!(owner.type_name(), "Address");
/// assert_eq!(field.name, "city");
/// ```
pub fn resolve_path<'a>(
    root: &'a dyn Record,
    path: &str,
) -> Result<(&'a dyn Record, &'static FieldDescriptor)> {
    resolve_from(root, path, path)
}

fn resolve_from<'a>(
    owner: &'a dyn Record,
    full_path: &str,
    path: &str,
) -> Result<(&'a dyn Record, &'static FieldDescriptor)> {
    let (head, rest) = split_head(path);
    let field = lookup_field(owner, full_path, head)?;

    let Some(rest) = rest else {
        return Ok((owner, field));
    };

    match owner.field_value(head) {
        Some(FieldValue::Nested(child)) => resolve_from(child, full_path, rest),
        _ => Err(SheetError::field_not_found(
            owner.type_name(),
            full_path,
            split_head(rest).0,
        )),
    }
}

/// Looks up one path segment on `owner`.
pub(crate) fn lookup_field(
    owner: &dyn Record,
    full_path: &str,
    segment: &str,
) -> Result<&'static FieldDescriptor> {
    find_field(owner, segment)
        .ok_or_else(|| SheetError::field_not_found(owner.type_name(), full_path, segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    struct Leaf {
        value: String,
    }

    impl Record for Leaf {
        fn type_name(&self) -> &'static str {
            "Leaf"
        }

        fn fields(&self) -> &'static [FieldDescriptor] {
            const FIELDS: &[FieldDescriptor] =
                &[FieldDescriptor::new("value", FieldKind::String, 0)];
            FIELDS
        }

        fn field_value(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "value" => Some(FieldValue::text(&self.value)),
                _ => None,
            }
        }
    }

    struct Branch {
        leaf: Option<Leaf>,
        tag: String,
    }

    impl Record for Branch {
        fn type_name(&self) -> &'static str {
            "Branch"
        }

        fn fields(&self) -> &'static [FieldDescriptor] {
            const FIELDS: &[FieldDescriptor] = &[
                FieldDescriptor::new("leaf", FieldKind::Nested, 0),
                FieldDescriptor::new("tag", FieldKind::String, 1),
            ];
            FIELDS
        }

        fn field_value(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "leaf" => Some(match &self.leaf {
                    Some(leaf) => FieldValue::Nested(leaf),
                    None => FieldValue::Null,
                }),
                "tag" => Some(FieldValue::text(&self.tag)),
                _ => None,
            }
        }
    }

    struct Root {
        branch: Branch,
    }

    impl Record for Root {
        fn type_name(&self) -> &'static str {
            "Root"
        }

        fn fields(&self) -> &'static [FieldDescriptor] {
            const FIELDS: &[FieldDescriptor] =
                &[FieldDescriptor::new("branch", FieldKind::Nested, 0)];
            FIELDS
        }

        fn field_value(&self, name: &str) -> Option<FieldValue<'_>> {
            match name {
                "branch" => Some(FieldValue::Nested(&self.branch)),
                _ => None,
            }
        }
    }

    fn tree(leaf: Option<&str>) -> Root {
        Root {
            branch: Branch {
                leaf: leaf.map(|value| Leaf {
                    value: value.to_string(),
                }),
                tag: "t".to_string(),
            },
        }
    }

    #[test]
    fn split_head_cases() {
        assert_eq!(split_head("a"), ("a", None));
        assert_eq!(split_head("a.b"), ("a", Some("b")));
        assert_eq!(split_head("a.b.c"), ("a", Some("b.c")));
    }

    #[test]
    fn single_segment_resolves_on_root() {
        let root = tree(Some("x"));
        let (owner, field) = resolve_path(&root, "branch").unwrap();
        assert_eq!(owner.type_name(), "Root");
        assert_eq!(field.name, "branch");
        assert_eq!(field.kind, FieldKind::Nested);
    }

    #[test]
    fn multi_segment_descends() {
        let root = tree(Some("x"));
        let (owner, field) = resolve_path(&root, "branch.leaf.value").unwrap();
        assert_eq!(owner.type_name(), "Leaf");
        assert_eq!(field.name, "value");
        assert_eq!(owner.field_value("value").unwrap().as_text(), Some("x"));
    }

    #[test]
    fn unknown_segment_is_field_not_found() {
        let root = tree(Some("x"));
        let Err(err) = resolve_path(&root, "branch.nope") else {
            panic!("`branch.nope` should not resolve");
        };
        match err {
            SheetError::FieldNotFound {
                type_name,
                path,
                segment,
            } => {
                assert_eq!(type_name, "Branch");
                assert_eq!(path, "branch.nope");
                assert_eq!(segment, "nope");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_intermediate_is_field_not_found() {
        let root = tree(None);
        let Err(err) = resolve_path(&root, "branch.leaf.value") else {
            panic!("a missing leaf should not resolve");
        };
        assert!(matches!(err, SheetError::FieldNotFound { .. }));
    }

    #[test]
    fn descending_through_scalar_fails() {
        let root = tree(Some("x"));
        let Err(err) = resolve_path(&root, "branch.tag.len") else {
            panic!("a scalar intermediate should not resolve");
        };
        assert!(err.to_string().contains("`len`"));
    }
}
