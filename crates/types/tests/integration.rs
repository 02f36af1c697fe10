//! Integration tests for report serialization

use chrono::Utc;
use vsaudit_types::{
    AuditReport, Classification, ClassificationRecord, Confidence, Coverage, DiscoveredFile,
    OrphanReason,
};

#[test]
fn report_serializes_with_stable_field_names() {
    let file = DiscoveredFile::new("ds1", "[ds1] old", "old.vmdk", 1024, None);
    let report = AuditReport {
        generated_at: Utc::now(),
        classifications: vec![ClassificationRecord {
            file,
            status: Classification::Orphaned,
            reason_code: OrphanReason::NoDescriptorFound.as_str().to_string(),
            confidence: Confidence::Heuristic,
            owner: None,
        }],
        snapshots: Vec::new(),
        coverage: Coverage::default(),
    };

    let json = serde_json::to_value(&report).expect("serialize");
    assert_eq!(json["classifications"][0]["status"], "orphaned");
    assert_eq!(
        json["classifications"][0]["reason_code"],
        "no VM descriptor found"
    );
    assert_eq!(json["coverage"]["vms_visited"], 0);

    let back: AuditReport = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back.orphans().count(), 1);
}
