use ministry_data::mapping::{decode, encode};
use ministry_data::utils::clock::FixedClock;
use ministry_data::*;
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};

const CREATED: &str = "2024-01-01T09:00:00.000Z";
const UPDATED: &str = "2024-02-01T09:00:00.000Z";

/// Encodes `entity` to a backend row, decodes it back, and checks nothing changed
/// and nothing was reported.
fn assert_round_trip<E: Entity>(value: Value) {
    let entity: E = serde_json::from_value(value).unwrap();
    assert_eq!(entity.created_at(), CREATED);

    let sink = MemorySink::new();
    let clock = FixedClock(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
    let ctx = MappingContext::new(&sink, &clock);

    let row = encode(&entity).unwrap();
    let decoded: E = decode(Value::Object(row), &ctx).unwrap();

    assert_eq!(decoded, entity, "{} did not round-trip", E::TABLE);
    assert!(sink.is_empty(), "{} wrote a legacy column", E::TABLE);
}

#[test]
fn test_family_entities_round_trip() {
    assert_round_trip::<Household>(json!({
        "household_id": "h1",
        "name": "Lee Family",
        "address_line1": "123 Main St",
        "address_line2": "",
        "city": "Testville",
        "state": "TX",
        "zip": "75001",
        "primary_email": "lee@example.org",
        "primary_phone": "555-0100",
        "preferred_scripture_translation": "NIV",
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<Guardian>(json!({
        "guardian_id": "g1",
        "household_id": "h1",
        "first_name": "Pat",
        "last_name": "Lee",
        "mobile_phone": "555-0101",
        "email": "pat@example.org",
        "relationship": "Mother",
        "is_primary": true,
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<Child>(json!({
        "child_id": "c1",
        "household_id": "h1",
        "first_name": "Ann",
        "last_name": "Lee",
        "dob": "2015-02-03",
        "grade": "3",
        "allergies": "peanuts",
        "special_needs": true,
        "special_needs_notes": "sensory breaks",
        "is_active": false,
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
}

#[test]
fn test_ministry_entities_round_trip() {
    assert_round_trip::<Ministry>(json!({
        "ministry_id": "m1",
        "name": "Choir",
        "code": "choir",
        "description": "Sunday choir",
        "is_active": true,
        "allows_checkin": true,
        "custom_questions": [{"id": "q1", "text": "Shirt size?"}],
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<MinistryEnrollment>(json!({
        "enrollment_id": "e1",
        "child_id": "c1",
        "cycle_id": "2025",
        "ministry_id": "m1",
        "status": "waitlisted",
        "custom_fields": {"shirt_size": "M"},
        "notes": "prefers alto",
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<RegistrationCycle>(json!({
        "cycle_id": "2025",
        "name": "Fall 2025",
        "start_date": "2025-08-01",
        "end_date": "2025-12-15",
        "is_active": true,
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<Attendance>(json!({
        "attendance_id": "a1",
        "event_id": "sunday-school",
        "child_id": "c1",
        "date": "2025-09-07",
        "timeslot_id": "9am",
        "check_in_at": "2025-09-07T08:55:00.000Z",
        "checked_in_by": "u1",
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<Incident>(json!({
        "incident_id": "i1",
        "child_id": "c1",
        "child_name": "Ann Lee",
        "event_id": "sunday-school",
        "description": "scraped knee",
        "severity": "medium",
        "leader_id": "u1",
        "timestamp": "2025-09-07T09:30:00.000Z",
        "admin_acknowledged_at": "2025-09-07T10:00:00.000Z",
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
}

#[test]
fn test_bible_bee_entities_round_trip() {
    assert_round_trip::<BibleBeeCycle>(json!({
        "id": "bb1",
        "name": "Bible Bee 2025",
        "cycle_id": "2025",
        "is_active": true,
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<Division>(json!({
        "id": "d1",
        "bible_bee_cycle_id": "bb1",
        "name": "Primary",
        "min_scriptures": 10,
        "min_grade": 1,
        "max_grade": 3,
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<Scripture>(json!({
        "id": "s1",
        "bible_bee_cycle_id": "bb1",
        "scripture_number": "1",
        "scripture_order": 1,
        "reference": "John 3:16",
        "category": "Primary Minimum",
        "texts": {"NIV": "For God so loved the world"},
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<StudentScripture>(json!({
        "id": "ss1",
        "child_id": "c1",
        "bible_bee_cycle_id": "bb1",
        "scripture_id": "s1",
        "status": "completed",
        "completed_at": "2025-10-01T00:00:00.000Z",
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<EssayPrompt>(json!({
        "id": "ep1",
        "bible_bee_cycle_id": "bb1",
        "division_name": "Senior",
        "title": "Faith",
        "prompt": "Describe what faith means to you.",
        "due_date": "2025-11-01",
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<StudentEssay>(json!({
        "id": "se1",
        "child_id": "c1",
        "bible_bee_cycle_id": "bb1",
        "essay_prompt_id": "ep1",
        "status": "submitted",
        "submitted_at": "2025-10-20T00:00:00.000Z",
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
}

#[test]
fn test_admin_entities_round_trip() {
    assert_round_trip::<User>(json!({
        "user_id": "u1",
        "name": "Sam Leader",
        "email": "sam@example.org",
        "role": "ministry_leader",
        "is_active": true,
        "background_check_status": "passed",
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
    assert_round_trip::<BrandingSettings>(json!({
        "setting_id": "b1",
        "org_id": "default",
        "app_name": "Kids Ministry",
        "logo_url": "https://example.org/logo.png",
        "use_logo_only": true,
        "primary_color": "#336699",
        "created_at": CREATED,
        "updated_at": UPDATED
    }));
}

#[test]
fn test_same_record_maps_identically_from_either_shape() {
    let sink = MemorySink::new();
    let clock = FixedClock(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap());
    let ctx = MappingContext::new(&sink, &clock);

    let legacy: Ministry = decode(
        json!({"ministry_id": "m1", "label": "Choir", "isActive": false,
               "created_at": CREATED, "updated_at": UPDATED}),
        &ctx,
    )
    .unwrap();
    assert_eq!(sink.len(), 2);

    let canonical: Ministry = decode(
        json!({"ministry_id": "m1", "name": "Choir", "is_active": false,
               "created_at": CREATED, "updated_at": UPDATED}),
        &ctx,
    )
    .unwrap();
    assert_eq!(sink.len(), 2);
    assert_eq!(legacy, canonical);
}
