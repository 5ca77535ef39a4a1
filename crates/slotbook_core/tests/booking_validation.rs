use slotbook_core::db::open_db_in_memory;
use slotbook_core::model::catalog::ServiceValidationError;
use slotbook_core::model::time::{MinuteRange, MINUTES_PER_DAY};
use slotbook_core::{
    AppointmentId, AppointmentPatch, AppointmentStatus, BookingError, BookingService,
    CatalogService, CatalogServiceError, ClientId, ClientPatch, ClientService, NewAppointment,
    NewOperatorProfile, OperatorProfilePatch, ProfileService, ReferenceKind, ServiceId,
    ServicePatch, SqliteAgendaStore,
};
use uuid::Uuid;

const DAY: &str = "2025-01-06";

struct Fixture {
    client: ClientId,
    /// 30 minutes.
    cut: ServiceId,
    /// 45 minutes.
    beard: ServiceId,
}

fn seed_catalog(store: SqliteAgendaStore<'_>) -> Fixture {
    let client = ClientService::new(store)
        .create_client("Bruno", "(11) 98765-4321")
        .unwrap()
        .id;
    let catalog = CatalogService::new(store);
    Fixture {
        client,
        cut: catalog.create_service("Haircut", 30, 4500).unwrap().id,
        beard: catalog.create_service("Beard trim", 45, 3000).unwrap().id,
    }
}

fn seed(store: SqliteAgendaStore<'_>, with_break: bool) -> Fixture {
    seed_profile(store, with_break);
    seed_catalog(store)
}

fn seed_profile(store: SqliteAgendaStore<'_>, with_break: bool) {
    ProfileService::new(store)
        .create_operator_profile(&NewOperatorProfile {
            display_name: "Rafa".to_string(),
            work_start: "09:00".to_string(),
            work_end: "18:00".to_string(),
            break_start: with_break.then(|| "12:00".to_string()),
            break_end: with_break.then(|| "13:00".to_string()),
        })
        .unwrap();
}

fn request(client: ClientId, service: ServiceId, hhmm: &str) -> NewAppointment {
    NewAppointment {
        client_id: client,
        service_id: service,
        start_at: format!("{DAY}T{hhmm}"),
        status: None,
        notes: None,
    }
}

fn book(
    booking: &BookingService<SqliteAgendaStore<'_>>,
    fixture: &Fixture,
    service: ServiceId,
    hhmm: &str,
) -> Result<AppointmentId, BookingError> {
    booking.validate_and_create(&request(fixture.client, service, hhmm))
}

#[test]
fn overlapping_candidate_is_rejected_and_abutting_one_accepted() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    let existing = book(&booking, &fixture, fixture.beard, "10:00").unwrap();

    for service in [fixture.cut, fixture.beard] {
        match book(&booking, &fixture, service, "10:30").unwrap_err() {
            BookingError::DoubleBooking {
                conflicting_id,
                conflicting,
                ..
            } => {
                assert_eq!(conflicting_id, existing);
                assert_eq!(conflicting, MinuteRange::new(600, 645));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    book(&booking, &fixture, fixture.cut, "10:45").unwrap();
    book(&booking, &fixture, fixture.cut, "09:30").unwrap();
}

#[test]
fn cancelled_appointment_never_blocks_its_slot() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    let first = book(&booking, &fixture, fixture.cut, "10:00").unwrap();
    booking
        .validate_and_update(
            first,
            &AppointmentPatch {
                status: Some(AppointmentStatus::Cancelled),
                ..AppointmentPatch::default()
            },
        )
        .unwrap();

    book(&booking, &fixture, fixture.cut, "10:00").unwrap();

    let mut cancelled = request(fixture.client, fixture.beard, "11:00");
    cancelled.status = Some(AppointmentStatus::Cancelled);
    booking.validate_and_create(&cancelled).unwrap();
    book(&booking, &fixture, fixture.cut, "11:00").unwrap();
}

#[test]
fn cancelled_records_are_still_placed_inside_the_schedule() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed_catalog(store);
    let booking = BookingService::new(store);

    let mut night = request(fixture.client, fixture.cut, "03:00");
    night.status = Some(AppointmentStatus::Cancelled);
    assert!(matches!(
        booking.validate_and_create(&night).unwrap_err(),
        BookingError::NoScheduleConfigured
    ));

    seed_profile(store, true);
    assert!(matches!(
        booking.validate_and_create(&night).unwrap_err(),
        BookingError::OutsideWorkingHours { boundary: 540, .. }
    ));

    let mut lunch = request(fixture.client, fixture.cut, "12:30");
    lunch.status = Some(AppointmentStatus::Cancelled);
    assert!(matches!(
        booking.validate_and_create(&lunch).unwrap_err(),
        BookingError::BreakConflict { .. }
    ));

    let taken = book(&booking, &fixture, fixture.beard, "10:00").unwrap();
    let mut clash = request(fixture.client, fixture.cut, "10:30");
    clash.status = Some(AppointmentStatus::Cancelled);
    match booking.validate_and_create(&clash).unwrap_err() {
        BookingError::DoubleBooking { conflicting_id, .. } => assert_eq!(conflicting_id, taken),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(booking.list_day_with_details(DAY).unwrap().len(), 1);
}

#[test]
fn end_may_touch_work_end_but_not_pass_it() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    book(&booking, &fixture, fixture.cut, "17:30").unwrap();

    for (hhmm, expected_boundary) in [("17:31", 1080), ("18:00", 1080), ("08:59", 540)] {
        match book(&booking, &fixture, fixture.cut, hhmm).unwrap_err() {
            BookingError::OutsideWorkingHours { boundary, work, .. } => {
                assert_eq!(boundary, expected_boundary, "start {hhmm}");
                assert_eq!(work, MinuteRange::new(540, 1080));
            }
            other => panic!("unexpected error for {hhmm}: {other}"),
        }
    }
}

#[test]
fn break_edges_are_bookable_and_interior_is_not() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, true);
    let booking = BookingService::new(store);

    book(&booking, &fixture, fixture.cut, "11:30").unwrap();
    book(&booking, &fixture, fixture.cut, "13:00").unwrap();

    for (service, hhmm) in [
        (fixture.cut, "12:00"),
        (fixture.cut, "12:45"),
        (fixture.beard, "11:30"),
    ] {
        let err = booking
            .validate_and_create(&request(fixture.client, service, hhmm))
            .unwrap_err();
        match err {
            BookingError::BreakConflict { break_window, .. } => {
                assert_eq!(break_window, MinuteRange::new(720, 780));
            }
            BookingError::DoubleBooking { .. } if hhmm == "11:30" => {
                panic!("break must be checked before other bookings")
            }
            other => panic!("unexpected error for {hhmm}: {other}"),
        }
    }
}

#[test]
fn missing_profile_means_nothing_is_bookable() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed_catalog(store);
    let booking = BookingService::new(store);

    let err = book(&booking, &fixture, fixture.cut, "10:00").unwrap_err();
    assert!(matches!(err, BookingError::NoScheduleConfigured));
    assert_eq!(err.code(), "no_schedule_configured");
}

#[test]
fn unresolved_references_are_reported_first() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    let ghost = Uuid::new_v4();
    let err = booking
        .validate_and_create(&request(ghost, fixture.cut, "not-a-time"))
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::ReferenceNotFound {
            kind: ReferenceKind::Client,
            id
        } if id == ghost
    ));

    let err = booking
        .validate_and_create(&request(fixture.client, ghost, "10:00"))
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::ReferenceNotFound {
            kind: ReferenceKind::Service,
            ..
        }
    ));

    CatalogService::new(store).remove_service(fixture.beard).unwrap();
    let err = book(&booking, &fixture, fixture.beard, "10:00").unwrap_err();
    assert!(matches!(
        err,
        BookingError::ReferenceNotFound {
            kind: ReferenceKind::Service,
            ..
        }
    ));
}

#[test]
fn malformed_start_stamps_are_invalid_date_time() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    for start_at in ["2025-01-06 10:00", "2025-13-01T10:00", "2025-01-06T10:00:30", ""] {
        let mut candidate = request(fixture.client, fixture.cut, "10:00");
        candidate.start_at = start_at.to_string();
        let err = booking.validate_and_create(&candidate).unwrap_err();
        assert!(
            matches!(err, BookingError::InvalidDateTime { ref input } if input == start_at),
            "unexpected error for `{start_at}`: {err}"
        );
    }

    let mut with_seconds = request(fixture.client, fixture.cut, "10:00:00");
    with_seconds.notes = Some("  first visit ".to_string());
    let id = booking.validate_and_create(&with_seconds).unwrap();
    let stored = booking.get_appointment(id).unwrap().unwrap();
    assert_eq!(stored.notes.as_deref(), Some("first visit"));
    assert_eq!(stored.status, AppointmentStatus::Confirmed);
}

#[test]
fn rejected_create_writes_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    book(&booking, &fixture, fixture.cut, "10:00").unwrap();
    book(&booking, &fixture, fixture.cut, "10:15").unwrap_err();
    book(&booking, &fixture, fixture.cut, "19:00").unwrap_err();

    assert_eq!(booking.list_day_with_details(DAY).unwrap().len(), 1);
}

#[test]
fn update_revalidates_the_merged_record_and_skips_itself() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    let first = book(&booking, &fixture, fixture.cut, "10:00").unwrap();
    let second = book(&booking, &fixture, fixture.cut, "11:00").unwrap();

    let move_to = |hhmm: &str| AppointmentPatch {
        start_at: Some(format!("{DAY}T{hhmm}")),
        ..AppointmentPatch::default()
    };

    let err = booking
        .validate_and_update(second, &move_to("10:15"))
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::DoubleBooking { conflicting_id, .. } if conflicting_id == first
    ));

    booking.validate_and_update(first, &move_to("10:30")).unwrap();

    let err = booking
        .validate_and_update(
            first,
            &AppointmentPatch {
                service_id: Some(fixture.beard),
                ..AppointmentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BookingError::DoubleBooking { .. }));

    booking
        .validate_and_update(
            first,
            &AppointmentPatch {
                status: Some(AppointmentStatus::Completed),
                notes: Some(Some("paid".to_string())),
                ..AppointmentPatch::default()
            },
        )
        .unwrap();
    let stored = booking.get_appointment(first).unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Completed);
    assert_eq!(stored.service_id, fixture.cut);
    assert_eq!(stored.notes.as_deref(), Some("paid"));
    assert_eq!(stored.start_minute(), 630);

    booking
        .validate_and_update(
            first,
            &AppointmentPatch {
                notes: Some(None),
                ..AppointmentPatch::default()
            },
        )
        .unwrap();
    assert_eq!(booking.get_appointment(first).unwrap().unwrap().notes, None);
}

#[test]
fn partial_update_catches_a_schedule_that_changed_underneath() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    let id = book(&booking, &fixture, fixture.cut, "12:15").unwrap();
    ProfileService::new(store)
        .update_operator_profile(&OperatorProfilePatch {
            break_window: Some(Some(("12:00".to_string(), "13:00".to_string()))),
            ..Default::default()
        })
        .unwrap();

    let err = booking
        .validate_and_update(
            id,
            &AppointmentPatch {
                status: Some(AppointmentStatus::Completed),
                ..AppointmentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BookingError::BreakConflict { .. }));
}

#[test]
fn cancelling_in_place_skips_time_rules_but_moving_does_not() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    let id = book(&booking, &fixture, fixture.cut, "12:15").unwrap();
    ProfileService::new(store)
        .update_operator_profile(&OperatorProfilePatch {
            break_window: Some(Some(("12:00".to_string(), "13:00".to_string()))),
            ..Default::default()
        })
        .unwrap();

    let err = booking
        .validate_and_update(
            id,
            &AppointmentPatch {
                start_at: Some(format!("{DAY}T07:00")),
                status: Some(AppointmentStatus::Cancelled),
                ..AppointmentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BookingError::OutsideWorkingHours { boundary: 540, .. }));

    let err = booking
        .validate_and_update(
            id,
            &AppointmentPatch {
                service_id: Some(fixture.beard),
                status: Some(AppointmentStatus::Cancelled),
                ..AppointmentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BookingError::BreakConflict { .. }));

    booking
        .validate_and_update(
            id,
            &AppointmentPatch {
                status: Some(AppointmentStatus::Cancelled),
                notes: Some(Some("rain".to_string())),
                ..AppointmentPatch::default()
            },
        )
        .unwrap();
    let stored = booking.get_appointment(id).unwrap().unwrap();
    assert_eq!(stored.status, AppointmentStatus::Cancelled);
    assert_eq!(stored.notes.as_deref(), Some("rain"));

    let err = booking
        .validate_and_update(
            id,
            &AppointmentPatch {
                status: Some(AppointmentStatus::Confirmed),
                ..AppointmentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BookingError::BreakConflict { .. }));
}

#[test]
fn empty_patch_leaves_a_stale_appointment_untouched() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);

    let id = book(&booking, &fixture, fixture.cut, "17:30").unwrap();
    ProfileService::new(store)
        .update_operator_profile(&OperatorProfilePatch {
            work_end: Some("17:00".to_string()),
            ..Default::default()
        })
        .unwrap();
    let before = booking.get_appointment(id).unwrap().unwrap();

    booking
        .validate_and_update(id, &AppointmentPatch::default())
        .unwrap();
    assert_eq!(booking.get_appointment(id).unwrap().unwrap(), before);

    let err = booking
        .validate_and_update(
            id,
            &AppointmentPatch {
                status: Some(AppointmentStatus::Completed),
                ..AppointmentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, BookingError::OutsideWorkingHours { boundary: 1020, .. }));
}

#[test]
fn service_longer_than_a_day_is_refused_before_any_booking() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let catalog = CatalogService::new(store);
    let booking = BookingService::new(store);

    let err = catalog
        .create_service("Marathon", u32::MAX - 100, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogServiceError::Validation(ServiceValidationError::DurationTooLong { .. })
    ));
    let err = catalog
        .update_service(
            fixture.cut,
            &ServicePatch {
                duration_minutes: Some(MINUTES_PER_DAY + 1),
                ..ServicePatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogServiceError::Validation(ServiceValidationError::DurationTooLong { .. })
    ));

    let whole_day = catalog
        .create_service("Whole day", MINUTES_PER_DAY, 0)
        .unwrap();
    let err = book(&booking, &fixture, whole_day.id, "10:00").unwrap_err();
    assert!(matches!(err, BookingError::OutsideWorkingHours { boundary: 1080, .. }));
}

#[test]
fn update_keeps_tombstoned_referents_but_refuses_new_ones() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, false);
    let booking = BookingService::new(store);
    let clients = ClientService::new(store);

    let id = book(&booking, &fixture, fixture.cut, "10:00").unwrap();
    clients.remove_client(fixture.client).unwrap();

    booking
        .validate_and_update(
            id,
            &AppointmentPatch {
                notes: Some(Some("came anyway".to_string())),
                ..AppointmentPatch::default()
            },
        )
        .unwrap();

    let other = clients.create_client("Caio", "21 99876 5432").unwrap();
    clients.remove_client(other.id).unwrap();
    let err = booking
        .validate_and_update(
            id,
            &AppointmentPatch {
                client_id: Some(other.id),
                ..AppointmentPatch::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::ReferenceNotFound {
            kind: ReferenceKind::Client,
            ..
        }
    ));

    let err = book(&booking, &fixture, fixture.cut, "11:00").unwrap_err();
    assert!(matches!(
        err,
        BookingError::ReferenceNotFound {
            kind: ReferenceKind::Client,
            ..
        }
    ));

    clients
        .update_client(other.id, &ClientPatch::default())
        .unwrap_err();
}

#[test]
fn updating_unknown_appointment_is_reference_not_found() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    seed(store, false);
    let booking = BookingService::new(store);

    let ghost = Uuid::new_v4();
    let err = booking
        .validate_and_update(ghost, &AppointmentPatch::default())
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::ReferenceNotFound {
            kind: ReferenceKind::Appointment,
            id
        } if id == ghost
    ));
}

#[test]
fn accepted_pairs_never_overlap() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteAgendaStore::try_new(&conn).unwrap();
    let fixture = seed(store, true);
    let booking = BookingService::new(store);

    for minute in (540..1080).step_by(5) {
        let hhmm = format!("{:02}:{:02}", minute / 60, minute % 60);
        let service = if minute % 2 == 0 { fixture.cut } else { fixture.beard };
        let _ = book(&booking, &fixture, service, &hhmm);
    }

    let day = booking.list_day_with_details(DAY).unwrap();
    assert!(!day.is_empty());
    for (index, a) in day.iter().enumerate() {
        for b in &day[index + 1..] {
            assert!(
                a.end_at <= b.appointment.start_at || b.end_at <= a.appointment.start_at,
                "{:?} overlaps {:?}",
                a.appointment.id,
                b.appointment.id
            );
        }
    }
}
