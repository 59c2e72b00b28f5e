//! Pure derivations over [`RunRecord`]: display tags and split-column
//! filter predicates. Nothing here mutates a record.

use strum::EnumIter;

use super::RunRecord;

/// The six timeline splits shown as table columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter)]
pub enum SplitColumn {
    EnterNether,
    EnterBastion,
    EnterFortress,
    NetherTravel,
    EnterStronghold,
    EnterEnd,
}

impl SplitColumn {
    pub fn title(self) -> &'static str {
        match self {
            SplitColumn::EnterNether => "Nether Enter",
            SplitColumn::EnterBastion => "Bastion",
            SplitColumn::EnterFortress => "Fortress",
            SplitColumn::NetherTravel => "Nether Exit",
            SplitColumn::EnterStronghold => "Stronghold",
            SplitColumn::EnterEnd => "End",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    Version,
    RunType,
    Completed,
    Hardcore,
    Coop,
    CheatsAllowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTag {
    pub label: String,
    pub category: TagCategory,
}

impl RunTag {
    fn new(label: impl Into<String>, category: TagCategory) -> Self {
        Self {
            label: label.into(),
            category,
        }
    }
}

/// Derives the tag strip for a run. Order is fixed (version, run type,
/// then the conditional flags) so rendered output and snapshots are
/// reproducible.
pub fn derive_tags(record: &RunRecord) -> Vec<RunTag> {
    let mut tags = vec![
        RunTag::new(record.mc_version.clone(), TagCategory::Version),
        RunTag::new(record.run_type.clone(), TagCategory::RunType),
    ];
    if record.is_completed {
        tags.push(RunTag::new("completed", TagCategory::Completed));
    }
    if record.is_hardcore {
        tags.push(RunTag::new("hardcore", TagCategory::Hardcore));
    }
    if record.is_coop {
        tags.push(RunTag::new("co-op", TagCategory::Coop));
    }
    if record.is_cheat_allowed {
        tags.push(RunTag::new("cheat-on", TagCategory::CheatsAllowed));
    }
    tags
}

/// The "exclude empty" predicate: a row survives the filter for a column
/// iff that split was actually reached. Evaluated per column.
pub fn split_reached(record: &RunRecord, column: SplitColumn) -> bool {
    record.split(column) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> RunRecord {
        RunRecord {
            world_name: "Test World".to_string(),
            mc_version: "1.16.1".to_string(),
            run_type: "RSG".to_string(),
            is_hardcore: true,
            is_coop: true,
            ..RunRecord::default()
        }
    }

    #[test]
    fn tag_order_is_deterministic() {
        let labels: Vec<String> = derive_tags(&record())
            .into_iter()
            .map(|tag| tag.label)
            .collect();
        insta::assert_debug_snapshot!(labels, @r###"
        [
            "1.16.1",
            "RSG",
            "hardcore",
            "co-op",
        ]
        "###);
    }

    #[test]
    fn version_and_run_type_are_always_present() {
        let bare = RunRecord {
            mc_version: "1.15.2".to_string(),
            run_type: "SSG".to_string(),
            ..RunRecord::default()
        };
        let tags = derive_tags(&bare);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].category, TagCategory::Version);
        assert_eq!(tags[1].category, TagCategory::RunType);
    }

    #[test]
    fn conditional_tags_follow_their_flags() {
        let mut r = record();
        r.is_completed = true;
        r.is_cheat_allowed = true;
        let categories: Vec<TagCategory> =
            derive_tags(&r).into_iter().map(|tag| tag.category).collect();
        assert_eq!(
            categories,
            vec![
                TagCategory::Version,
                TagCategory::RunType,
                TagCategory::Completed,
                TagCategory::Hardcore,
                TagCategory::Coop,
                TagCategory::CheatsAllowed,
            ]
        );
    }

    #[test]
    fn exclude_empty_keeps_reached_splits_only() {
        let mut r = RunRecord::default();
        r.enter_nether = 120_000;
        assert!(split_reached(&r, SplitColumn::EnterNether));
        assert!(!split_reached(&r, SplitColumn::EnterBastion));

        r.enter_nether = 0;
        assert!(!split_reached(&r, SplitColumn::EnterNether));
    }
}
