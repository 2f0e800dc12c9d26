//! Classification of every object of two mapped databases.

use std::collections::BTreeMap;

use serde::Serialize;
use sqlmorph_core::{Database, ObjectKey, ObjectKind, ObjectRef, Result, Table};

use crate::scripter::Scripter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Unchanged,
    Modified,
    OnlySource,
    OnlyTarget,
}

/// One classified object; positions index the kind's collection on each side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComparisonItem {
    pub kind: ObjectKind,
    pub key: ObjectKey,
    pub status: DiffStatus,
    pub source: Option<usize>,
    pub target: Option<usize>,
}

/// Flat, ordered diff of two databases.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Comparison {
    pub items: Vec<ComparisonItem>,
}

impl Comparison {
    /// Mapped objects whose fingerprints differ.
    pub fn different(&self) -> impl Iterator<Item = &ComparisonItem> {
        self.with_status(DiffStatus::Modified)
    }

    pub fn only_source(&self) -> impl Iterator<Item = &ComparisonItem> {
        self.with_status(DiffStatus::OnlySource)
    }

    pub fn only_target(&self) -> impl Iterator<Item = &ComparisonItem> {
        self.with_status(DiffStatus::OnlyTarget)
    }

    pub fn unchanged(&self) -> impl Iterator<Item = &ComparisonItem> {
        self.with_status(DiffStatus::Unchanged)
    }

    pub fn is_identical(&self) -> bool {
        self.items
            .iter()
            .all(|item| item.status == DiffStatus::Unchanged)
    }

    /// Item counts per status, for summaries.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for item in &self.items {
            let label = match item.status {
                DiffStatus::Unchanged => "unchanged",
                DiffStatus::Modified => "modified",
                DiffStatus::OnlySource => "only_source",
                DiffStatus::OnlyTarget => "only_target",
            };
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }

    fn with_status(&self, status: DiffStatus) -> impl Iterator<Item = &ComparisonItem> {
        self.items.iter().filter(move |item| item.status == status)
    }
}

/// Classify every object of two databases already paired by the mapper.
///
/// Mapped objects compare by the scripter's canonical create script; the
/// source table is rendered in the target table's column order so that
/// column position alone never marks a table modified. Items are ordered by
/// kind, then schema, name and owning table.
pub fn diff_databases<S: Scripter + ?Sized>(
    scripter: &S,
    source: &Database,
    target: &Database,
) -> Result<Comparison> {
    let mut items = Vec::new();

    for kind in ObjectKind::TOP_LEVEL {
        for (idx, object) in source.objects(kind).into_iter().enumerate() {
            let counterpart = object
                .mapped()
                .and_then(|other| target.object(kind, other).map(|found| (other, found)));
            let item = match counterpart {
                Some((other, counterpart)) => {
                    let reference = table_of(counterpart);
                    let left = scripter.canonical_script(source, object, reference)?;
                    let right = scripter.canonical_script(target, counterpart, reference)?;
                    let status = if left == right {
                        DiffStatus::Unchanged
                    } else {
                        DiffStatus::Modified
                    };
                    ComparisonItem {
                        kind,
                        key: object.key(),
                        status,
                        source: Some(idx),
                        target: Some(other),
                    }
                }
                None => ComparisonItem {
                    kind,
                    key: object.key(),
                    status: DiffStatus::OnlySource,
                    source: Some(idx),
                    target: None,
                },
            };
            items.push(item);
        }

        for (idx, object) in target.objects(kind).into_iter().enumerate() {
            let mapped = object
                .mapped()
                .is_some_and(|other| source.object(kind, other).is_some());
            if !mapped {
                items.push(ComparisonItem {
                    kind,
                    key: object.key(),
                    status: DiffStatus::OnlyTarget,
                    source: None,
                    target: Some(idx),
                });
            }
        }
    }

    items.sort_by(|left, right| sort_key(left).cmp(&sort_key(right)));

    let comparison = Comparison { items };
    let counts = comparison.counts();
    tracing::info!(
        event = "diff_databases",
        source = %source.name,
        target = %target.name,
        unchanged = counts.get("unchanged").copied().unwrap_or(0),
        modified = counts.get("modified").copied().unwrap_or(0),
        only_source = counts.get("only_source").copied().unwrap_or(0),
        only_target = counts.get("only_target").copied().unwrap_or(0),
    );
    Ok(comparison)
}

fn table_of(object: ObjectRef<'_>) -> Option<&Table> {
    match object {
        ObjectRef::Table(table) => Some(table),
        _ => None,
    }
}

fn sort_key(item: &ComparisonItem) -> (ObjectKind, &str, &str, Option<&str>) {
    (
        item.kind,
        item.key.schema.as_str(),
        item.key.name.as_str(),
        item.key.table.as_deref(),
    )
}
