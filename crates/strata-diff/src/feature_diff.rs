//! Attribute-level diff between two versions of a feature.
//!
//! Attributes are matched by name through each version's feature type, so
//! a schema change (added, dropped or reordered attributes) is reported in
//! terms of the attributes themselves rather than positions.

use serde::{Deserialize, Serialize};
use strata_store::{ObjectDatabase, RevFeature, RevFeatureType, Value};
use strata_types::ObjectId;

use crate::entry::DiffEntry;
use crate::error::{DiffError, DiffResult};

/// A single attribute change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AttributeChange {
    Added { name: String, value: Value },
    Removed { name: String, value: Value },
    Modified { name: String, old: Value, new: Value },
}

impl AttributeChange {
    pub fn name(&self) -> &str {
        match self {
            Self::Added { name, .. } | Self::Removed { name, .. } | Self::Modified { name, .. } => {
                name
            }
        }
    }
}

/// The attribute changes of one feature.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureDiff {
    pub path: String,
    pub changes: Vec<AttributeChange>,
    /// The two versions use different feature types.
    pub schema_changed: bool,
}

impl FeatureDiff {
    /// Compare two versions. A missing side contributes no attributes, so
    /// every attribute of the other side is added or removed.
    pub fn compute(
        path: impl Into<String>,
        old: Option<(&RevFeature, &RevFeatureType)>,
        new: Option<(&RevFeature, &RevFeatureType)>,
    ) -> Self {
        let named = |side: Option<(&RevFeature, &RevFeatureType)>| -> Vec<(String, Value)> {
            side.map(|(feature, ft)| {
                ft.attributes
                    .iter()
                    .zip(feature.values.iter())
                    .map(|(attr, value)| (attr.name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
        };
        let old_values = named(old);
        let new_values = named(new);

        let mut changes = Vec::new();
        for (name, old_value) in &old_values {
            match new_values.iter().find(|(n, _)| n == name) {
                Some((_, new_value)) if new_value != old_value => {
                    changes.push(AttributeChange::Modified {
                        name: name.clone(),
                        old: old_value.clone(),
                        new: new_value.clone(),
                    })
                }
                Some(_) => {}
                None => changes.push(AttributeChange::Removed {
                    name: name.clone(),
                    value: old_value.clone(),
                }),
            }
        }
        for (name, new_value) in &new_values {
            if !old_values.iter().any(|(n, _)| n == name) {
                changes.push(AttributeChange::Added {
                    name: name.clone(),
                    value: new_value.clone(),
                });
            }
        }

        let schema_changed = match (old, new) {
            (Some((a, _)), Some((b, _))) => a.feature_type != b.feature_type,
            _ => false,
        };
        Self {
            path: path.into(),
            changes,
            schema_changed,
        }
    }

    /// Load both sides of `entry` and compare them.
    pub fn from_entry(db: &ObjectDatabase, entry: &DiffEntry) -> DiffResult<Self> {
        let path = entry.path().to_string();
        let old_is_tree = entry.old.as_ref().is_some_and(|n| n.is_tree());
        let new_is_tree = entry.new.as_ref().is_some_and(|n| n.is_tree());
        if old_is_tree || new_is_tree {
            return Err(DiffError::NotAFeature(path));
        }
        let old = load(db, &path, entry.old_object_id())?;
        let new = load(db, &path, entry.new_object_id())?;
        Ok(Self::compute(
            path,
            old.as_ref().map(|(f, t)| (f, t)),
            new.as_ref().map(|(f, t)| (f, t)),
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

fn load(
    db: &ObjectDatabase,
    path: &str,
    id: ObjectId,
) -> DiffResult<Option<(RevFeature, RevFeatureType)>> {
    if id.is_null() {
        return Ok(None);
    }
    let feature = db.get_feature(&id)?;
    if feature.feature_type.is_null() {
        return Err(DiffError::MissingFeatureType(path.to_string()));
    }
    let feature_type = db.get_feature_type(&feature.feature_type)?;
    Ok(Some((feature, feature_type)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_store::{AttributeDescriptor, AttributeKind, NodeRef};

    fn schema(extra: bool) -> RevFeatureType {
        let mut attrs = vec![
            AttributeDescriptor::new("name", AttributeKind::Text, true),
            AttributeDescriptor::new("geom", AttributeKind::Geometry, false),
        ];
        if extra {
            attrs.push(AttributeDescriptor::new("lanes", AttributeKind::Int, true));
        }
        RevFeatureType::new("roads", attrs)
    }

    #[test]
    fn modified_attribute() {
        let ft = schema(false);
        let ft_id = ObjectId::from_bytes(b"ft");
        let point = || Value::Geometry("POINT (0 0)".into());
        let a = RevFeature::new(ft_id, vec![Value::Text("A1".into()), point()]);
        let b = RevFeature::new(ft_id, vec![Value::Text("A2".into()), point()]);

        let diff = FeatureDiff::compute("roads/r1", Some((&a, &ft)), Some((&b, &ft)));
        assert_eq!(diff.len(), 1);
        assert_eq!(
            diff.changes[0],
            AttributeChange::Modified {
                name: "name".into(),
                old: Value::Text("A1".into()),
                new: Value::Text("A2".into()),
            }
        );
        assert!(!diff.schema_changed);
    }

    #[test]
    fn schema_change_reports_new_attribute() {
        let (old_ft, new_ft) = (schema(false), schema(true));
        let a = RevFeature::new(
            ObjectId::from_bytes(b"v1"),
            vec![Value::Null, Value::Geometry("POINT (1 1)".into())],
        );
        let b = RevFeature::new(
            ObjectId::from_bytes(b"v2"),
            vec![Value::Null, Value::Geometry("POINT (1 1)".into()), Value::Int(2)],
        );
        let diff = FeatureDiff::compute("r", Some((&a, &old_ft)), Some((&b, &new_ft)));
        assert!(diff.schema_changed);
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.changes[0].name(), "lanes");
        assert!(matches!(diff.changes[0], AttributeChange::Added { .. }));
    }

    #[test]
    fn from_entry_loads_both_sides() {
        let db = ObjectDatabase::in_memory();
        let ft_id = db.put(&schema(false)).unwrap();
        let old_id = db
            .put(&RevFeature::new(ft_id, vec![Value::Null, Value::Geometry("POINT (0 0)".into())]))
            .unwrap();
        let new_id = db
            .put(&RevFeature::new(ft_id, vec![Value::Null, Value::Geometry("POINT (5 5)".into())]))
            .unwrap();
        let entry = DiffEntry::modified(
            NodeRef::feature("pts/p1", old_id, ft_id),
            NodeRef::feature("pts/p1", new_id, ft_id),
        );
        let diff = FeatureDiff::from_entry(&db, &entry).unwrap();
        assert_eq!(diff.path, "pts/p1");
        assert_eq!(diff.changes[0].name(), "geom");

        let added = DiffEntry::added(NodeRef::feature("pts/p1", new_id, ft_id));
        let diff = FeatureDiff::from_entry(&db, &added).unwrap();
        assert_eq!(diff.len(), 2);
        assert!(diff.changes.iter().all(|c| matches!(c, AttributeChange::Added { .. })));
    }

    #[test]
    fn untyped_feature_is_an_error() {
        let db = ObjectDatabase::in_memory();
        let id = db.put(&RevFeature::new(ObjectId::NULL, vec![Value::Int(1)])).unwrap();
        let entry = DiffEntry::added(NodeRef::feature("x", id, ObjectId::NULL));
        assert!(matches!(
            FeatureDiff::from_entry(&db, &entry),
            Err(DiffError::MissingFeatureType(_))
        ));
    }

    #[test]
    fn serializes_to_json() {
        let diff = FeatureDiff {
            path: "p".into(),
            changes: vec![AttributeChange::Removed {
                name: "n".into(),
                value: Value::Int(3),
            }],
            schema_changed: false,
        };
        let json = serde_json::to_string(&diff).unwrap();
        let back: FeatureDiff = serde_json::from_str(&json).unwrap();
        assert_eq!(back, diff);
    }
}
