use super::*;
use crate::id::SequentialIdGen;
use std::collections::HashSet;

fn defaults() -> BTreeMap<String, DefaultJobDefinition> {
    let mut map = BTreeMap::new();
    map.insert(
        "nightly-jira-sync".to_string(),
        DefaultJobDefinition {
            enabled: true,
            auto_start: true,
            schedule: Some("0 2 * * *".into()),
            description: "Nightly Jira crawl".into(),
            kind: crate::job::JobKind::Crawler,
        },
    );
    map.insert(
        "weekly-vacuum".to_string(),
        DefaultJobDefinition {
            enabled: true,
            auto_start: false,
            schedule: Some("0 3 * * 0".into()),
            description: "Weekly database vacuum".into(),
            kind: crate::job::JobKind::Maintenance,
        },
    );
    map
}

#[test]
fn seeds_every_default_when_storage_is_empty() {
    let id_gen = SequentialIdGen::new("jd");
    let plan = plan_seed(&HashSet::new(), &defaults(), &id_gen);
    assert_eq!(plan.len(), 2);
}

#[test]
fn skips_definitions_that_already_exist_by_name() {
    let id_gen = SequentialIdGen::new("jd");
    let mut existing = HashSet::new();
    existing.insert("nightly-jira-sync".to_string());

    let plan = plan_seed(&existing, &defaults(), &id_gen);

    assert_eq!(plan.len(), 1);
    assert_eq!(plan[0].name, "weekly-vacuum");
}

#[test]
fn seeding_is_idempotent_across_two_runs() {
    let id_gen = SequentialIdGen::new("jd");
    let first_run = plan_seed(&HashSet::new(), &defaults(), &id_gen);
    let seeded_names: HashSet<String> = first_run.iter().map(|d| d.name.clone()).collect();

    let second_run = plan_seed(&seeded_names, &defaults(), &id_gen);

    assert!(second_run.is_empty());
}
