//! Conformance test suite for [`AuthLoginStore`] implementations.
//!
//! Each function checks one clause of the store contract against whatever
//! backend it is given. Functions only touch records whose `user_id` they
//! generate themselves, so the suite also runs against a shared, non-empty
//! database.
//!
//! ```ignore
//! use auth_logins::store::{MemoryAuthLoginStore, conformance};
//!
//! conformance::run_all(&MemoryAuthLoginStore::new());
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use super::AuthLoginStore;
use crate::db::error::StoreError;
use crate::db::models::auth_login::{AuthLogin, NewAuthLogin, UpdateAuthLogin};

/// A `user_id` no other test run will produce.
pub fn unique_user_id(tag: &str) -> String {
    format!("auth0|{tag}-{}", uuid::Uuid::new_v4().simple())
}

/// A fully populated profile, as an identity provider would send it.
pub fn sample_record(user_id: &str) -> NewAuthLogin {
    NewAuthLogin {
        user_id: user_id.to_string(),
        name: "Ada Lovelace".to_string(),
        nickname: "ada".to_string(),
        username: "alovelace".to_string(),
        email: "a@b.com".to_string(),
        email_verified: true,
        picture: "https://example.com/ada.png".to_string(),
        company: "Analytical Engines".to_string(),
        blog: "https://ada.example.com".to_string(),
        phone: "+44 20 7946 0000".to_string(),
        phone_verified: false,
        locale: "en-GB".to_string(),
        login_provider: "auth0".to_string(),
        last_login: at(2024, 1, 15),
        last_ip: "192.0.2.10".to_string(),
        logins_count: 0,
    }
}

fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
        .single()
        .expect("valid fixture date")
}

/// Runs every single-threaded check.
pub fn run_all<S: AuthLoginStore>(store: &S) {
    create_assigns_id_and_timestamps(store);
    create_assigns_distinct_increasing_ids(store);
    create_duplicate_user_id_is_duplicate_key(store);
    create_rejects_blank_required_values(store);
    find_by_user_id_unknown_is_not_found(store);
    find_by_id_returns_the_created_record(store);
    update_applies_only_given_fields(store);
    update_unknown_user_is_not_found(store);
    update_rejects_blank_email(store);
    update_empty_changes_touches_only_updated_at(store);
    record_login_increments_and_overwrites(store);
    record_login_unknown_user_is_not_found(store);
    record_login_past_max_count_is_a_database_error(store);
    timestamps_read_back_at_microsecond_precision(store);
    upsert_creates_then_overwrites(store);
    list_is_ordered_by_id(store);
}

/// `create` returns the stored row with `created_at == updated_at`.
pub fn create_assigns_id_and_timestamps<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("create");
    let record = sample_record(&user_id);

    let created = store.create(&record).expect("create should succeed");

    assert!(created.id > 0, "id should be assigned: {created:?}");
    assert_eq!(created.user_id, user_id);
    assert_eq!(created.email, record.email);
    assert_eq!(created.logins_count, 0);
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(store.find_by_user_id(&user_id).expect("find"), created);
}

pub fn create_assigns_distinct_increasing_ids<S: AuthLoginStore>(store: &S) {
    let first = store
        .create(&sample_record(&unique_user_id("ids")))
        .expect("create first");
    let second = store
        .create(&sample_record(&unique_user_id("ids")))
        .expect("create second");
    assert!(second.id > first.id, "{} should exceed {}", second.id, first.id);
}

pub fn create_duplicate_user_id_is_duplicate_key<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("dup");
    let original = store.create(&sample_record(&user_id)).expect("create");

    let again = NewAuthLogin {
        name: "Someone Else".to_string(),
        ..sample_record(&user_id)
    };
    let err = store.create(&again).expect_err("duplicate must fail");

    assert!(err.is_duplicate_key(), "unexpected error: {err:?}");
    assert_eq!(store.find_by_user_id(&user_id).expect("find"), original);
}

pub fn create_rejects_blank_required_values<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("blank");
    let cases = [
        NewAuthLogin {
            email: String::new(),
            ..sample_record(&user_id)
        },
        NewAuthLogin {
            login_provider: " ".to_string(),
            ..sample_record(&user_id)
        },
        NewAuthLogin {
            logins_count: -3,
            ..sample_record(&user_id)
        },
    ];

    for record in &cases {
        let err = store.create(record).expect_err("blank value must be rejected");
        assert!(err.is_constraint_violation(), "unexpected error: {err:?}");
    }
    let err = store
        .create(&sample_record(""))
        .expect_err("blank user_id must be rejected");
    assert!(err.is_constraint_violation(), "unexpected error: {err:?}");

    assert!(store.find_by_user_id(&user_id).unwrap_err().is_not_found());
}

pub fn find_by_user_id_unknown_is_not_found<S: AuthLoginStore>(store: &S) {
    let err = store
        .find_by_user_id(&unique_user_id("ghost"))
        .expect_err("unknown user_id");
    assert!(err.is_not_found(), "unexpected error: {err:?}");
}

pub fn find_by_id_returns_the_created_record<S: AuthLoginStore>(store: &S) {
    let created = store
        .create(&sample_record(&unique_user_id("by-id")))
        .expect("create");
    assert_eq!(store.find_by_id(created.id).expect("find by id"), created);
    assert!(store.find_by_id(-1).unwrap_err().is_not_found());
}

pub fn update_applies_only_given_fields<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("update");
    let created = store.create(&sample_record(&user_id)).expect("create");

    let changes = UpdateAuthLogin {
        nickname: Some("countess".to_string()),
        email_verified: Some(false),
        company: Some(String::new()),
        ..Default::default()
    };
    let updated = store.update(&user_id, &changes).expect("update");

    assert_eq!(updated.nickname, "countess");
    assert!(!updated.email_verified);
    assert_eq!(updated.company, "");
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(
        AuthLogin {
            nickname: created.nickname.clone(),
            email_verified: created.email_verified,
            company: created.company.clone(),
            updated_at: created.updated_at,
            ..updated.clone()
        },
        created,
        "fields not named in the update must not change"
    );
}

pub fn update_unknown_user_is_not_found<S: AuthLoginStore>(store: &S) {
    let changes = UpdateAuthLogin {
        locale: Some("fr-FR".to_string()),
        ..Default::default()
    };
    let err = store
        .update(&unique_user_id("ghost"), &changes)
        .expect_err("unknown user_id");
    assert!(err.is_not_found(), "unexpected error: {err:?}");
}

pub fn update_rejects_blank_email<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("blank-email");
    let created = store.create(&sample_record(&user_id)).expect("create");

    let changes = UpdateAuthLogin {
        email: Some(String::new()),
        ..Default::default()
    };
    let err = store.update(&user_id, &changes).expect_err("blank email");

    assert!(err.is_constraint_violation(), "unexpected error: {err:?}");
    assert_eq!(store.find_by_user_id(&user_id).expect("find"), created);
}

pub fn update_empty_changes_touches_only_updated_at<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("touch");
    let created = store.create(&sample_record(&user_id)).expect("create");

    let updated = store
        .update(&user_id, &UpdateAuthLogin::default())
        .expect("empty update");

    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(
        AuthLogin {
            updated_at: created.updated_at,
            ..updated
        },
        created
    );
}

/// The worked example: one login from `1.2.3.4` at `t1`.
pub fn record_login_increments_and_overwrites<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("login");
    let created = store.create(&sample_record(&user_id)).expect("create");
    let t1 = at(2024, 2, 1);

    let after = store
        .record_login(&user_id, "1.2.3.4", t1)
        .expect("record login");

    assert_eq!(after.logins_count, 1);
    assert_eq!(after.last_ip, "1.2.3.4");
    assert_eq!(after.last_login, t1);
    assert!(after.updated_at >= created.updated_at);
    assert_eq!(
        AuthLogin {
            logins_count: created.logins_count,
            last_ip: created.last_ip.clone(),
            last_login: created.last_login,
            updated_at: created.updated_at,
            ..after.clone()
        },
        created,
        "record_login must leave every other field unchanged"
    );

    let again = store
        .record_login(&user_id, "5.6.7.8", at(2024, 2, 2))
        .expect("second login");
    assert_eq!(again.logins_count, 2);
    assert_eq!(again.last_ip, "5.6.7.8");
}

pub fn record_login_unknown_user_is_not_found<S: AuthLoginStore>(store: &S) {
    let err = store
        .record_login(&unique_user_id("ghost"), "1.2.3.4", at(2024, 2, 1))
        .expect_err("unknown user_id");
    assert!(err.is_not_found(), "unexpected error: {err:?}");
}

pub fn record_login_past_max_count_is_a_database_error<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("max-count");
    store.create(&sample_record(&user_id)).expect("create");
    let full = store
        .update(
            &user_id,
            &UpdateAuthLogin {
                logins_count: Some(i32::MAX),
                ..Default::default()
            },
        )
        .expect("update");

    let err = store
        .record_login(&user_id, "1.2.3.4", at(2024, 2, 1))
        .expect_err("count overflow");

    assert!(matches!(err, StoreError::Database(_)), "unexpected error: {err:?}");
    assert_eq!(store.find_by_user_id(&user_id).expect("find"), full);
}

/// Nanosecond inputs come back cut to microseconds, identical to what a
/// later read returns.
pub fn timestamps_read_back_at_microsecond_precision<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("micros");
    let t0 = at(2024, 1, 15) + Duration::nanoseconds(123_456_789);
    let created = store
        .create(&NewAuthLogin {
            last_login: t0,
            ..sample_record(&user_id)
        })
        .expect("create");
    assert_eq!(created.last_login, at(2024, 1, 15) + Duration::microseconds(123_456));
    assert_eq!(created.created_at.timestamp_subsec_nanos() % 1_000, 0);
    assert_eq!(store.find_by_user_id(&user_id).expect("find"), created);

    let t1 = at(2024, 2, 1) + Duration::nanoseconds(987_654_321);
    let after = store
        .record_login(&user_id, "1.2.3.4", t1)
        .expect("record login");
    assert_eq!(after.last_login, at(2024, 2, 1) + Duration::microseconds(987_654));
    assert_eq!(after.updated_at.timestamp_subsec_nanos() % 1_000, 0);
    assert_eq!(store.find_by_user_id(&user_id).expect("find"), after);

    let changes = UpdateAuthLogin {
        last_login: Some(at(2024, 3, 1) + Duration::nanoseconds(1_999)),
        ..Default::default()
    };
    let updated = store.update(&user_id, &changes).expect("update");
    assert_eq!(updated.last_login, at(2024, 3, 1) + Duration::microseconds(1));
    assert_eq!(store.find_by_user_id(&user_id).expect("find"), updated);
}

pub fn upsert_creates_then_overwrites<S: AuthLoginStore>(store: &S) {
    let user_id = unique_user_id("upsert");

    let created = store.upsert(&sample_record(&user_id)).expect("first upsert");
    assert_eq!(created.created_at, created.updated_at);

    let refreshed = NewAuthLogin {
        name: "Augusta Ada King".to_string(),
        picture: "https://example.com/ada-2.png".to_string(),
        logins_count: 12,
        ..sample_record(&user_id)
    };
    let updated = store.upsert(&refreshed).expect("second upsert");

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at >= created.updated_at);
    assert_eq!(updated.name, "Augusta Ada King");
    assert_eq!(updated.picture, "https://example.com/ada-2.png");
    assert_eq!(updated.logins_count, 12);

    let err = store
        .upsert(&NewAuthLogin {
            email: String::new(),
            ..refreshed
        })
        .expect_err("blank email");
    assert!(err.is_constraint_violation(), "unexpected error: {err:?}");
}

pub fn list_is_ordered_by_id<S: AuthLoginStore>(store: &S) {
    let mut ours = Vec::new();
    for _ in 0..3 {
        let created = store
            .create(&sample_record(&unique_user_id("list")))
            .expect("create");
        ours.push(created.id);
    }

    let all = store.list().expect("list");
    assert!(all.windows(2).all(|w| w[0].id < w[1].id), "list must be ordered by id");

    let listed: Vec<i32> = all
        .iter()
        .map(|r| r.id)
        .filter(|id| ours.contains(id))
        .collect();
    assert_eq!(listed, ours);
}

/// Parallel `record_login` calls on one user must each be counted once.
pub fn concurrent_record_login_counts_every_login<S: AuthLoginStore + 'static>(store: Arc<S>) {
    const THREADS: i32 = 8;
    const LOGINS_PER_THREAD: i32 = 25;

    let user_id = unique_user_id("concurrent");
    store.create(&sample_record(&user_id)).expect("create");

    std::thread::scope(|scope| {
        for t in 0..THREADS {
            let store = Arc::clone(&store);
            let user_id = user_id.as_str();
            scope.spawn(move || {
                for _ in 0..LOGINS_PER_THREAD {
                    store
                        .record_login(user_id, &format!("10.0.0.{t}"), Utc::now())
                        .expect("record login");
                }
            });
        }
    });

    let after = store.find_by_user_id(&user_id).expect("find");
    assert_eq!(after.logins_count, THREADS * LOGINS_PER_THREAD);
}
