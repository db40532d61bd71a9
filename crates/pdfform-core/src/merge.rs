//! Field data reconciliation
//!
//! Carries freshly extracted geometry into a hand-maintained data file
//! without losing the types and values authored there.

use crate::model::FieldDataDocument;
use std::collections::HashMap;
use tracing::debug;

/// Counts reported by a merge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Fields of `to` whose rect and page were overwritten
    pub updated: usize,
    /// Fields of `from` appended to `to`
    pub added: usize,
}

/// Merge the geometry of `from` into `to`.
///
/// A field in `from` whose name matches one in `to` overwrites only that
/// field's `rect` and `page`; its type, value and any extra keys are kept.
/// A field with no match is appended. Nothing in `to` is ever removed, and
/// `to`'s page count and content hash are left as they were. When `to`
/// names a field more than once, the last occurrence receives the update.
pub fn merge_field_data(from: &FieldDataDocument, to: &mut FieldDataDocument) -> MergeSummary {
    let mut index: HashMap<String, usize> = to
        .fields
        .iter()
        .enumerate()
        .map(|(position, field)| (field.name.clone(), position))
        .collect();

    let mut summary = MergeSummary::default();
    for field in &from.fields {
        match index.get(&field.name) {
            Some(&position) => {
                let target = &mut to.fields[position];
                target.rect = field.rect;
                target.page = field.page;
                summary.updated += 1;
            }
            None => {
                index.insert(field.name.clone(), to.fields.len());
                to.fields.push(field.clone());
                summary.added += 1;
                debug!("Added field '{}'", field.name);
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, FieldType};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_geometry_moves_and_new_fields_append() {
        let from = FieldDataDocument::new(
            2,
            vec![
                FieldDescriptor::new("a", 1, [0.0, 0.0, 10.0, 10.0]),
                FieldDescriptor::new("c", 0, [5.0, 5.0, 6.0, 6.0]),
            ],
        );
        let mut to = FieldDataDocument::new(
            2,
            vec![
                FieldDescriptor::new("a", 0, [1.0, 1.0, 2.0, 2.0])
                    .with_type(FieldType::PlainText)
                    .with_value("x"),
                FieldDescriptor::new("b", 0, [3.0, 3.0, 4.0, 4.0]),
            ],
        );

        let summary = merge_field_data(&from, &mut to);

        assert_eq!(summary, MergeSummary { updated: 1, added: 1 });
        assert_eq!(
            to.fields,
            vec![
                FieldDescriptor::new("a", 1, [0.0, 0.0, 10.0, 10.0])
                    .with_type(FieldType::PlainText)
                    .with_value("x"),
                FieldDescriptor::new("b", 0, [3.0, 3.0, 4.0, 4.0]),
                FieldDescriptor::new("c", 0, [5.0, 5.0, 6.0, 6.0]),
            ]
        );
    }

    #[test]
    fn test_page_count_and_hash_are_untouched() {
        let mut from = FieldDataDocument::new(5, vec![]);
        from.content_hash = Some("new".into());
        let mut to = FieldDataDocument::new(2, vec![]);
        to.content_hash = Some("old".into());

        merge_field_data(&from, &mut to);

        assert_eq!(to.num_pages, 2);
        assert_eq!(to.content_hash.as_deref(), Some("old"));
    }

    #[test]
    fn test_last_duplicate_in_target_receives_update() {
        let from = FieldDataDocument::new(1, vec![FieldDescriptor::new("dup", 0, [9.0, 9.0, 10.0, 10.0])]);
        let mut to = FieldDataDocument::new(
            1,
            vec![
                FieldDescriptor::new("dup", 0, [1.0, 1.0, 2.0, 2.0]),
                FieldDescriptor::new("dup", 0, [3.0, 3.0, 4.0, 4.0]),
            ],
        );

        merge_field_data(&from, &mut to);

        assert_eq!(to.fields[0].rect, [1.0, 1.0, 2.0, 2.0]);
        assert_eq!(to.fields[1].rect, [9.0, 9.0, 10.0, 10.0]);
    }

    #[test]
    fn test_duplicate_new_name_in_source_is_appended_once() {
        let from = FieldDataDocument::new(
            1,
            vec![
                FieldDescriptor::new("n", 0, [1.0, 1.0, 2.0, 2.0]),
                FieldDescriptor::new("n", 0, [5.0, 5.0, 6.0, 6.0]),
            ],
        );
        let mut to = FieldDataDocument::new(1, vec![]);

        let summary = merge_field_data(&from, &mut to);

        assert_eq!(summary, MergeSummary { updated: 1, added: 1 });
        assert_eq!(to.fields.len(), 1);
        assert_eq!(to.fields[0].rect, [5.0, 5.0, 6.0, 6.0]);
    }

    fn arb_field() -> impl Strategy<Value = FieldDescriptor> {
        ("[a-e]", 0u32..3, prop::array::uniform4(0.0f64..500.0))
            .prop_map(|(name, page, rect)| FieldDescriptor::new(name, page, rect))
    }

    fn arb_document() -> impl Strategy<Value = FieldDataDocument> {
        prop::collection::vec(arb_field(), 0..8).prop_map(|fields| FieldDataDocument::new(3, fields))
    }

    proptest! {
        #[test]
        fn merging_twice_equals_merging_once(from in arb_document(), to in arb_document()) {
            let mut once = to.clone();
            merge_field_data(&from, &mut once);
            let mut twice = once.clone();
            merge_field_data(&from, &mut twice);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn merge_never_removes_fields(from in arb_document(), to in arb_document()) {
            let mut merged = to.clone();
            merge_field_data(&from, &mut merged);
            for field in &to.fields {
                prop_assert!(merged.fields.iter().any(|f| f.name == field.name));
            }
            prop_assert!(merged.fields.len() >= to.fields.len());
        }
    }
}
