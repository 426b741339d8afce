use super::*;

crate::define_id! {
    pub struct TestId;
}

#[test]
fn display_roundtrip() {
    let id = TestId::new("abc-123");
    assert_eq!(id.to_string(), "abc-123");
    assert_eq!(id.as_str(), "abc-123");
}

#[test]
fn equality_against_str() {
    let id = TestId::new("job-1");
    assert_eq!(id, *"job-1");
    assert_eq!(id, "job-1");
}

#[test]
fn sequential_gen_increments() {
    let gen = SequentialIdGen::new("doc");
    assert_eq!(gen.next(), "doc-1");
    assert_eq!(gen.next(), "doc-2");
}

#[test]
fn uuid_gen_produces_distinct_ids() {
    let gen = UuidIdGen;
    assert_ne!(gen.next(), gen.next());
}
