mod common;

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Weekday};
use uuid::Uuid;

use appointment_cell::models::{AppointmentError, AppointmentOwner, AppointmentStatus, ListFilter};
use barber_cell::models::{Provider, Service, WorkingHours};
use shared_models::auth::{Actor, ActorRole};

use common::{at, monday, new_client, t, test_policy, Shop};

#[tokio::test]
async fn booking_removes_slot_and_cancel_restores_it() {
    let shop = Shop::new().await;
    let client = new_client();

    let slots = shop
        .engine
        .get_availability(shop.provider.id, monday(), shop.haircut.id)
        .await
        .unwrap();
    let starts: Vec<_> = slots.iter().map(|slot| slot.start).collect();
    assert_eq!(starts, vec![t(9, 0), t(9, 30), t(10, 0), t(10, 30), t(11, 0), t(11, 30)]);
    assert!(slots.iter().all(|slot| slot.duration_minutes == 30 && slot.date == monday()));

    let booked = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, monday(), t(10, 0)))
        .await
        .unwrap();
    assert_eq!(booked.status, AppointmentStatus::Pending);
    assert_eq!(booked.duration_minutes, 30);
    assert_eq!(booked.price_cents, 2500);

    let after_booking = shop
        .engine
        .get_availability(shop.provider.id, monday(), shop.haircut.id)
        .await
        .unwrap();
    assert_eq!(after_booking.len(), 5);
    assert!(after_booking.iter().all(|slot| slot.start != t(10, 0)));

    let cancelled = shop.engine.cancel_booking(&client, booked.id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let restored = shop
        .engine
        .get_availability(shop.provider.id, monday(), shop.haircut.id)
        .await
        .unwrap();
    assert_eq!(restored, slots);
}

#[tokio::test]
async fn every_listed_slot_can_be_booked() {
    let shop = Shop::new().await;

    let slots = shop
        .engine
        .get_availability(shop.provider.id, monday(), shop.long_cut.id)
        .await
        .unwrap();
    assert_eq!(slots.len(), 5);

    // Back-to-back 60 minute bookings at 09:00, 10:00 and 11:00 fill the morning.
    for start in [t(9, 0), t(10, 0), t(11, 0)] {
        let client = new_client();
        shop.engine
            .create_booking(&client, shop.request(client.id, &shop.long_cut, monday(), start))
            .await
            .unwrap();
    }

    let remaining = shop
        .engine
        .get_availability(shop.provider.id, monday(), shop.haircut.id)
        .await
        .unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn booking_ending_at_close_succeeds_and_one_minute_past_fails() {
    let mut policy = test_policy();
    policy.slot_granularity_minutes = 1;
    let shop = Shop::with_policy(policy).await;

    let mut provider = shop.provider.clone();
    provider.slot_granularity_minutes = None;
    shop.catalog.upsert_provider(provider).await.unwrap();

    let client = new_client();
    let fits = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, monday(), t(11, 30)))
        .await
        .unwrap();
    assert_eq!(fits.ends_at(), at(monday(), 12, 0));

    let late = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.long_cut, monday(), t(11, 1)))
        .await;
    assert_matches!(late, Err(AppointmentError::ProviderClosed(_)));
}

#[tokio::test]
async fn closed_day_and_early_start_are_rejected() {
    let shop = Shop::new().await;
    let client = new_client();
    let sunday = monday() - Duration::days(1) + Duration::days(7);

    let slots = shop
        .engine
        .get_availability(shop.provider.id, sunday, shop.haircut.id)
        .await
        .unwrap();
    assert!(slots.is_empty());

    let closed = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, sunday, t(10, 0)))
        .await;
    assert_matches!(closed, Err(AppointmentError::ProviderClosed(_)));

    // No working-hours entry for Wednesday means closed.
    let wednesday = monday() + Duration::days(2);
    let missing_entry = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, wednesday, t(10, 0)))
        .await;
    assert_matches!(missing_entry, Err(AppointmentError::ProviderClosed(_)));

    let before_open = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, monday(), t(8, 30)))
        .await;
    assert_matches!(before_open, Err(AppointmentError::ProviderClosed(_)));
}

#[tokio::test]
async fn off_grid_past_and_too_soon_starts_are_invalid() {
    let mut policy = test_policy();
    policy.min_lead_time_minutes = 90;
    let shop = Shop::with_policy(policy).await;
    let client = new_client();

    let off_grid = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, monday(), t(10, 15)))
        .await;
    assert_matches!(off_grid, Err(AppointmentError::InvalidRequest(_)));

    let yesterday = monday() - Duration::days(1);
    let past = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, yesterday, t(10, 0)))
        .await;
    assert_matches!(past, Err(AppointmentError::InvalidRequest(_)));

    // Now is 08:00, so anything up to 09:30 is inside the lead time.
    let too_soon = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, monday(), t(9, 30)))
        .await;
    assert_matches!(too_soon, Err(AppointmentError::InvalidRequest(_)));

    let slots = shop
        .engine
        .get_availability(shop.provider.id, monday(), shop.haircut.id)
        .await
        .unwrap();
    assert_eq!(slots.first().map(|slot| slot.start), Some(t(10, 0)));

    let past_slots = shop
        .engine
        .get_availability(shop.provider.id, yesterday, shop.haircut.id)
        .await
        .unwrap();
    assert!(past_slots.is_empty());
}

#[tokio::test]
async fn overlapping_booking_conflicts_but_adjacent_does_not() {
    let shop = Shop::new().await;
    let first = new_client();
    let second = new_client();

    shop.engine
        .create_booking(&first, shop.request(first.id, &shop.long_cut, monday(), t(10, 0)))
        .await
        .unwrap();

    let overlapping = shop
        .engine
        .create_booking(&second, shop.request(second.id, &shop.haircut, monday(), t(10, 30)))
        .await;
    assert_eq!(overlapping.err(), Some(AppointmentError::SlotConflict));

    let adjacent = shop
        .engine
        .create_booking(&second, shop.request(second.id, &shop.haircut, monday(), t(11, 0)))
        .await;
    assert!(adjacent.is_ok());
}

#[tokio::test]
async fn unknown_ids_and_foreign_services() {
    let shop = Shop::new().await;
    let client = new_client();

    let mut request = shop.request(client.id, &shop.haircut, monday(), t(10, 0));
    request.provider_id = Uuid::new_v4();
    assert_matches!(
        shop.engine.create_booking(&client, request).await,
        Err(AppointmentError::NotFound(_))
    );

    let mut request = shop.request(client.id, &shop.haircut, monday(), t(10, 0));
    request.service_id = Uuid::new_v4();
    assert_matches!(
        shop.engine.create_booking(&client, request).await,
        Err(AppointmentError::NotFound(_))
    );

    assert_matches!(
        shop.engine.get_availability(Uuid::new_v4(), monday(), shop.haircut.id).await,
        Err(AppointmentError::NotFound(_))
    );

    let mut other = shop.provider.clone();
    other.id = Uuid::new_v4();
    let foreign = Service {
        id: Uuid::new_v4(),
        provider_id: other.id,
        name: "Shave".to_string(),
        duration_minutes: 20,
        price_cents: 1500,
    };
    other.services = vec![foreign.clone()];
    shop.catalog.upsert_provider(other).await.unwrap();

    assert_matches!(
        shop.engine
            .create_booking(&client, shop.request(client.id, &foreign, monday(), t(10, 0)))
            .await,
        Err(AppointmentError::InvalidRequest(_))
    );
    assert_matches!(
        shop.engine.get_availability(shop.provider.id, monday(), foreign.id).await,
        Err(AppointmentError::InvalidRequest(_))
    );
}

#[tokio::test]
async fn clients_book_only_for_themselves() {
    let shop = Shop::new().await;
    let client = new_client();
    let someone_else = Uuid::new_v4();

    let result = shop
        .engine
        .create_booking(&client, shop.request(someone_else, &shop.haircut, monday(), t(10, 0)))
        .await;
    assert_matches!(result, Err(AppointmentError::Forbidden(_)));

    let stranger_provider = Actor::new(Uuid::new_v4(), ActorRole::Provider);
    let result = shop
        .engine
        .create_booking(&stranger_provider, shop.request(someone_else, &shop.haircut, monday(), t(10, 0)))
        .await;
    assert_matches!(result, Err(AppointmentError::Forbidden(_)));

    // Walk-ins: the provider books on a client's behalf.
    let walk_in = shop
        .engine
        .create_booking(&shop.provider_actor(), shop.request(someone_else, &shop.haircut, monday(), t(10, 0)))
        .await
        .unwrap();
    assert_eq!(walk_in.client_id, someone_else);
}

#[tokio::test]
async fn auto_confirm_policy_books_confirmed() {
    let mut policy = test_policy();
    policy.auto_confirm = true;
    let shop = Shop::with_policy(policy).await;
    let client = new_client();

    let booked = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, monday(), t(9, 0)))
        .await
        .unwrap();
    assert_eq!(booked.status, AppointmentStatus::Confirmed);
}

#[tokio::test]
async fn listing_respects_owner_filter_and_ordering() {
    let shop = Shop::new().await;
    let client = new_client();
    let tuesday = monday() + Duration::days(1);

    for (date, start) in [(tuesday, t(15, 0)), (monday(), t(11, 0)), (monday(), t(9, 0))] {
        shop.engine
            .create_booking(&client, shop.request(client.id, &shop.haircut, date, start))
            .await
            .unwrap();
    }
    let other = new_client();
    let others = shop
        .engine
        .create_booking(&other, shop.request(other.id, &shop.haircut, monday(), t(10, 0)))
        .await
        .unwrap();
    shop.engine.cancel_booking(&other, others.id).await.unwrap();

    let mine = shop
        .engine
        .list_appointments(&client, AppointmentOwner::Client(client.id), &ListFilter::default())
        .await
        .unwrap();
    let starts: Vec<_> = mine.iter().map(|a| a.starts_at()).collect();
    assert_eq!(starts, vec![at(monday(), 9, 0), at(monday(), 11, 0), at(tuesday, 15, 0)]);

    let monday_active = shop
        .engine
        .list_appointments(
            &shop.provider_actor(),
            AppointmentOwner::Provider(shop.provider.id),
            &ListFilter {
                from: Some(monday()),
                to: Some(monday()),
                statuses: Some(AppointmentStatus::ACTIVE.to_vec()),
            },
        )
        .await
        .unwrap();
    assert_eq!(monday_active.len(), 2);

    let snooping = shop
        .engine
        .list_appointments(&other, AppointmentOwner::Client(client.id), &ListFilter::default())
        .await;
    assert_matches!(snooping, Err(AppointmentError::Forbidden(_)));

    let admin = Actor::new(Uuid::new_v4(), ActorRole::Admin);
    let everything = shop
        .engine
        .list_appointments(&admin, AppointmentOwner::Provider(shop.provider.id), &ListFilter::default())
        .await
        .unwrap();
    assert_eq!(everything.len(), 4);
}

#[tokio::test]
async fn appointment_reads_are_owner_scoped() {
    let shop = Shop::new().await;
    let client = new_client();
    let booked = shop
        .engine
        .create_booking(&client, shop.request(client.id, &shop.haircut, monday(), t(9, 0)))
        .await
        .unwrap();

    assert_eq!(shop.engine.get_appointment(&client, booked.id).await.unwrap(), booked);
    assert!(shop.engine.get_appointment(&shop.provider_actor(), booked.id).await.is_ok());
    assert_matches!(
        shop.engine.get_appointment(&new_client(), booked.id).await,
        Err(AppointmentError::Forbidden(_))
    );
    assert_matches!(
        shop.engine.get_appointment(&client, Uuid::new_v4()).await,
        Err(AppointmentError::NotFound(_))
    );
}

#[tokio::test]
async fn last_calendar_day_is_handled_without_overflow() {
    let shop = Shop::new().await;
    let client = new_client();
    let provider_id = Uuid::new_v4();
    let late_cut = Service {
        id: Uuid::new_v4(),
        provider_id,
        name: "Late cut".to_string(),
        duration_minutes: 30,
        price_cents: 3000,
    };
    let night_owl = Provider {
        id: provider_id,
        name: "Night owl".to_string(),
        working_hours: [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(|day| WorkingHours::open(day, t(23, 0), t(23, 59)))
        .collect(),
        services: vec![late_cut.clone()],
        slot_granularity_minutes: Some(30),
    };
    shop.catalog.upsert_provider(night_owl).await.unwrap();

    let slots = shop
        .engine
        .get_availability(provider_id, NaiveDate::MAX, late_cut.id)
        .await
        .unwrap();
    assert_eq!(slots.iter().map(|slot| slot.start).collect::<Vec<_>>(), vec![t(23, 0)]);

    let mut request = shop.request(client.id, &late_cut, NaiveDate::MAX, t(23, 30));
    request.provider_id = provider_id;
    let result = shop.engine.create_booking(&client, request).await;
    assert_matches!(result, Err(AppointmentError::InvalidRequest(_)));
}
