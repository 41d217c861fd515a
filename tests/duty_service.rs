#![forbid(unsafe_code)]
use duty_roster::{
    AuditAction, CreateDutyRequest, DutyError, DutyId, DutyKind, DutyQuery, DutyService,
    GenerateDutyRequest, JsonStorage, MemoryAuditSink, MemoryStorage, PersonId, Repository,
    UpdateDutyRequest,
};
use std::sync::Arc;
use tempfile::tempdir;

fn service() -> (DutyService<MemoryStorage>, Arc<Repository<MemoryStorage>>, Arc<MemoryAuditSink>) {
    let repo = Arc::new(Repository::new(MemoryStorage::new()));
    let audit = Arc::new(MemoryAuditSink::new());
    (DutyService::new(Arc::clone(&repo), audit.clone()), repo, audit)
}

fn admin() -> PersonId {
    PersonId::new("admin")
}

fn create(kind: DutyKind, date: &str, floor: Option<i32>, who: &str) -> CreateDutyRequest {
    CreateDutyRequest {
        kind,
        date: date.to_string(),
        floor,
        assignee_id: PersonId::new(who),
    }
}

fn generate_week(svc: &DutyService<MemoryStorage>) -> Vec<duty_roster::DutyShift> {
    svc.generate(
        &admin(),
        &GenerateDutyRequest {
            kind: DutyKind::Regular,
            start_date: "2025-10-06".into(),
            end_date: "2025-10-12".into(),
            assignee_ids: vec![PersonId::new("X"), PersonId::new("Y")],
            floor: None,
        },
    )
    .unwrap()
}

#[test]
fn create_single_validates_like_a_generated_day() {
    let (svc, _, audit) = service();
    let duty = svc.create(&admin(), &create(DutyKind::Regular, "2025-10-12", None, "X")).unwrap();
    assert_eq!(duty.date.to_string(), "2025-10-12");
    assert!(!duty.completed);

    let friday = svc.create(&admin(), &create(DutyKind::Regular, "2025-10-10", None, "X"));
    assert!(matches!(friday, Err(DutyError::IneligibleWeekday { .. })));

    let no_floor = svc.create(&admin(), &create(DutyKind::NightStudy, "2025-10-07", None, "X"));
    assert!(matches!(no_floor, Err(DutyError::MissingFloor)));

    let bad_date = svc.create(&admin(), &create(DutyKind::Regular, "12/10/2025", None, "X"));
    assert!(matches!(bad_date, Err(DutyError::DateFormatInvalid(_))));

    let events = audit.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::Create);
    assert_eq!(events[0].entity_id.as_deref(), Some(duty.id.as_str()));
}

#[test]
fn generate_persists_whole_batch_in_one_write() {
    let (svc, repo, audit) = service();
    let created = generate_week(&svc);
    assert_eq!(created.len(), 5);
    assert_eq!(repo.with_storage(|s| s.save_count()).unwrap(), 1);
    assert_eq!(svc.list(&DutyQuery::default()).unwrap().len(), 5);

    let events = audit.events();
    assert_eq!(events[0].action, AuditAction::Generate);
    assert_eq!(events[0].details.as_ref().unwrap()["count"], 5);
}

#[test]
fn failed_generation_writes_nothing() {
    let (svc, repo, _) = service();
    let err = svc
        .generate(
            &admin(),
            &GenerateDutyRequest {
                kind: DutyKind::Regular,
                start_date: "2025-10-12".into(),
                end_date: "2025-10-06".into(),
                assignee_ids: vec![PersonId::new("X")],
                floor: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, DutyError::InvalidRange { .. }));
    assert_eq!(repo.with_storage(|s| s.save_count()).unwrap(), 0);
}

#[test]
fn update_applies_only_supplied_fields() {
    let (svc, _, _) = service();
    let duty = svc.create(&admin(), &create(DutyKind::NightStudy, "2025-10-07", Some(2), "X")).unwrap();

    let updated = svc
        .update(
            &admin(),
            &duty.id,
            &UpdateDutyRequest {
                assignee_id: Some(PersonId::new("Z")),
                date: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.assignee_id.as_str(), "Z");
    assert_eq!(updated.date, duty.date);
    assert_eq!(updated.floor, Some(2));
    assert_eq!(updated.kind, DutyKind::NightStudy);

    let moved = svc
        .update(
            &admin(),
            &duty.id,
            &UpdateDutyRequest { date: Some("2025-10-08".into()), ..Default::default() },
        )
        .unwrap();
    assert_eq!(moved.date.to_string(), "2025-10-08");
    assert_eq!(svc.get(&duty.id).unwrap(), moved);
}

#[test]
fn update_to_night_study_requires_a_floor() {
    let (svc, repo, _) = service();
    let duty = svc.create(&admin(), &create(DutyKind::Regular, "2025-10-06", None, "X")).unwrap();
    let saves = repo.with_storage(|s| s.save_count()).unwrap();

    let err = svc
        .update(
            &admin(),
            &duty.id,
            &UpdateDutyRequest { kind: Some(DutyKind::NightStudy), ..Default::default() },
        )
        .unwrap_err();
    assert!(matches!(err, DutyError::MissingFloor));
    assert_eq!(svc.get(&duty.id).unwrap(), duty);
    assert_eq!(repo.with_storage(|s| s.save_count()).unwrap(), saves);

    let night = svc
        .update(
            &admin(),
            &duty.id,
            &UpdateDutyRequest {
                kind: Some(DutyKind::NightStudy),
                floor: Some(3),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!((night.kind, night.floor), (DutyKind::NightStudy, Some(3)));

    let back = svc
        .update(
            &admin(),
            &duty.id,
            &UpdateDutyRequest { kind: Some(DutyKind::Regular), ..Default::default() },
        )
        .unwrap();
    assert_eq!(back.floor, None);
}

#[test]
fn update_and_delete_unknown_are_not_found() {
    let (svc, _, _) = service();
    let missing = DutyId::new("missing");
    assert!(matches!(
        svc.update(&admin(), &missing, &UpdateDutyRequest::default()),
        Err(DutyError::NotFound { .. })
    ));
    assert!(matches!(svc.delete(&admin(), &missing), Err(DutyError::NotFound { .. })));
}

#[test]
fn delete_is_hard() {
    let (svc, _, _) = service();
    let duty = svc.create(&admin(), &create(DutyKind::Regular, "2025-10-06", None, "X")).unwrap();
    svc.delete(&admin(), &duty.id).unwrap();
    assert!(matches!(svc.get(&duty.id), Err(DutyError::NotFound { .. })));
}

#[test]
fn list_filters_by_assignee_and_dates() {
    let (svc, _, _) = service();
    generate_week(&svc);
    let xs = svc
        .list(&DutyQuery {
            assignee_id: Some(PersonId::new("X")),
            start_date: Some("2025-10-07".into()),
            end_date: Some("2025-10-12".into()),
            ..Default::default()
        })
        .unwrap();
    let dates: Vec<String> = xs.iter().map(|d| d.date.to_string()).collect();
    assert_eq!(dates, vec!["2025-10-08", "2025-10-12"]);

    let bad = svc.list(&DutyQuery { start_date: Some("oct 7".into()), ..Default::default() });
    assert!(matches!(bad, Err(DutyError::DateFormatInvalid(_))));
}

#[test]
fn exchange_swaps_exactly_two_assignees() {
    let (svc, _, _) = service();
    let week = generate_week(&svc);
    let (a, b) = svc.exchange_assignees(&admin(), &week[0].id, &week[1].id).unwrap();
    assert_eq!(a.assignee_id.as_str(), "Y");
    assert_eq!(b.assignee_id.as_str(), "X");
    assert_eq!(svc.get(&week[2].id).unwrap().assignee_id.as_str(), "X");
}

#[test]
fn complete_is_idempotent() {
    let (svc, repo, audit) = service();
    let duty = svc.create(&admin(), &create(DutyKind::Regular, "2025-10-06", None, "X")).unwrap();
    assert!(svc.complete(&admin(), &duty.id).unwrap().completed);
    let saves = repo.with_storage(|s| s.save_count()).unwrap();
    assert!(svc.complete(&admin(), &duty.id).unwrap().completed);

    assert_eq!(repo.with_storage(|s| s.save_count()).unwrap(), saves);
    let completions = audit
        .events()
        .iter()
        .filter(|e| e.action == AuditAction::Complete)
        .count();
    assert_eq!(completions, 1);
}

#[test]
fn json_storage_roundtrips_through_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("duties.json");
    let repo = Arc::new(Repository::new(JsonStorage::open(&path).unwrap()));
    let svc = DutyService::new(Arc::clone(&repo), Arc::new(MemoryAuditSink::new()));
    let duty = svc.create(&admin(), &create(DutyKind::NightStudy, "2025-10-09", Some(4), "X")).unwrap();

    let reopened = DutyService::new(
        Arc::new(Repository::new(JsonStorage::open(&path).unwrap())),
        Arc::new(MemoryAuditSink::new()),
    );
    assert_eq!(reopened.get(&duty.id).unwrap(), duty);
}

#[test]
fn separate_handles_on_one_file_lose_no_writes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("duties.json");

    let handles: Vec<_> = ["2025-10-06", "2025-10-07", "2025-10-08", "2025-10-09"]
        .into_iter()
        .map(|date| {
            let path = path.clone();
            std::thread::spawn(move || {
                let svc = DutyService::new(
                    Arc::new(Repository::new(JsonStorage::open(&path).unwrap())),
                    Arc::new(MemoryAuditSink::new()),
                );
                svc.create(&admin(), &create(DutyKind::Regular, date, None, "X")).unwrap()
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let reopened = DutyService::new(
        Arc::new(Repository::new(JsonStorage::open(&path).unwrap())),
        Arc::new(MemoryAuditSink::new()),
    );
    assert_eq!(reopened.list(&DutyQuery::default()).unwrap().len(), 4);
}
