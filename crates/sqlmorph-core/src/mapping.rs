//! Pairing of objects across a source and a target database.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::model::{Database, Direction, ObjectKey, ObjectKind};

/// How object names are compared when pairing two databases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatching {
    /// Exact, case-sensitive comparison.
    #[default]
    Ordinal,
    CaseInsensitive,
}

impl NameMatching {
    fn key(self, key: ObjectKey) -> ObjectKey {
        match self {
            NameMatching::Ordinal => key,
            NameMatching::CaseInsensitive => key.folded(),
        }
    }
}

/// Per-kind pairing counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingCounts {
    pub matched: usize,
    pub only_source: usize,
    pub only_target: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingSummary {
    pub kinds: BTreeMap<ObjectKind, MappingCounts>,
}

impl MappingSummary {
    pub fn matched(&self) -> usize {
        self.kinds.values().map(|counts| counts.matched).sum()
    }
}

/// Link every object in `source` with its counterpart in `target`.
///
/// Links are symmetric and each object gets at most one counterpart.
/// Previous links are cleared first; objects without a counterpart keep
/// `mapped == None`.
pub fn map_databases(
    source: &mut Database,
    target: &mut Database,
    matching: NameMatching,
) -> MappingSummary {
    source.clear_mapping();
    target.clear_mapping();
    source.direction = Direction::Source;
    target.direction = Direction::Target;

    let mut summary = MappingSummary::default();

    for kind in ObjectKind::TOP_LEVEL {
        let mut candidates: HashMap<ObjectKey, usize> = HashMap::new();
        for (idx, object) in target.objects(kind).into_iter().enumerate() {
            candidates.entry(matching.key(object.key())).or_insert(idx);
        }

        let mut pairs = Vec::new();
        for (idx, object) in source.objects(kind).into_iter().enumerate() {
            if let Some(counterpart) = candidates.remove(&matching.key(object.key())) {
                pairs.push((idx, counterpart));
            }
        }

        for (source_idx, target_idx) in &pairs {
            source.set_mapped(kind, *source_idx, Some(*target_idx));
            target.set_mapped(kind, *target_idx, Some(*source_idx));
        }

        let counts = MappingCounts {
            matched: pairs.len(),
            only_source: source.len(kind) - pairs.len(),
            only_target: target.len(kind) - pairs.len(),
        };
        tracing::debug!(
            event = "map_kind",
            kind = kind.as_str(),
            matched = counts.matched,
            only_source = counts.only_source,
            only_target = counts.only_target,
        );
        summary.kinds.insert(kind, counts);
    }

    tracing::info!(
        event = "map_databases",
        source = %source.name,
        target = %target.name,
        matched = summary.matched(),
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::model::{Index, ObjectRef, Table};

    fn db(tables: &[&str]) -> Database {
        let mut db = Database::new("db", Dialect::SqlServer);
        for name in tables {
            db.tables.push(Table::new("dbo", *name));
        }
        db
    }

    #[test]
    fn links_are_symmetric() {
        let mut source = db(&["orders", "users"]);
        let mut target = db(&["users", "legacy"]);

        let summary = map_databases(&mut source, &mut target, NameMatching::Ordinal);

        assert_eq!(source.tables[1].mapped, Some(0));
        assert_eq!(target.tables[0].mapped, Some(1));
        assert_eq!(source.tables[0].mapped, None);
        assert_eq!(target.tables[1].mapped, None);
        assert_eq!(source.direction, Direction::Source);
        assert_eq!(target.direction, Direction::Target);

        let tables = &summary.kinds[&ObjectKind::Table];
        assert_eq!(tables.matched, 1);
        assert_eq!(tables.only_source, 1);
        assert_eq!(tables.only_target, 1);
    }

    #[test]
    fn ordinal_matching_is_case_sensitive() {
        let mut source = db(&["Users"]);
        let mut target = db(&["users"]);

        map_databases(&mut source, &mut target, NameMatching::Ordinal);
        assert_eq!(source.tables[0].mapped, None);

        map_databases(&mut source, &mut target, NameMatching::CaseInsensitive);
        assert_eq!(source.tables[0].mapped, Some(0));
    }

    #[test]
    fn indexes_match_within_their_table() {
        let index = |table: &str| Index {
            table_schema: "dbo".into(),
            table_name: table.into(),
            name: "ix_created".into(),
            ..Index::default()
        };
        let mut source = db(&["a", "b"]);
        source.indexes = vec![index("a"), index("b")];
        let mut target = db(&["b"]);
        target.indexes = vec![index("b")];

        map_databases(&mut source, &mut target, NameMatching::Ordinal);

        assert_eq!(source.object(ObjectKind::Index, 0).unwrap().mapped(), None);
        assert_eq!(source.object(ObjectKind::Index, 1).unwrap().mapped(), Some(0));
        assert!(matches!(
            target.object(ObjectKind::Index, 0),
            Some(ObjectRef::Index(ix)) if ix.mapped == Some(1)
        ));
    }
}
