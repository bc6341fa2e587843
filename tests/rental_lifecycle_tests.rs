use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use vehicle_rental::models::account::{Account, Role};
use vehicle_rental::models::rental::{RateUnit, RentalState};
use vehicle_rental::models::vehicle::{NewVehicle, Vehicle, VehicleType};
use vehicle_rental::repositories::{AccountLedger, InMemoryStore, RentalRepository, VehicleDirectory};
use vehicle_rental::services::pricing_service;
use vehicle_rental::services::rental_service::{AdminRental, RentalService};
use vehicle_rental::utils::clock::ManualClock;
use vehicle_rental::utils::errors::{AppError, AppResult, RentalError};
use vehicle_rental::utils::locks::KeyedLocks;

struct World {
    store: InMemoryStore,
    clock: ManualClock,
    rentals: RentalService,
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn world() -> World {
    let store = InMemoryStore::new();
    let clock = ManualClock::new(t0());
    let rentals = RentalService::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        KeyedLocks::new(),
        Arc::new(clock.clone()),
    );
    World { store, clock, rentals }
}

impl World {
    async fn account(&self, balance: i64) -> Account {
        let account = Account {
            id: Uuid::new_v4(),
            username: format!("user-{}", Uuid::new_v4()),
            password_hash: "hash".to_string(),
            role: Role::User,
            balance: Decimal::from(balance),
            created_at: t0(),
        };
        AccountLedger::create(&self.store, &account).await.unwrap();
        account
    }

    async fn vehicle(&self, owner: &Account, minute_price: Option<i64>, day_price: Option<i64>) -> Vehicle {
        VehicleDirectory::create(
            &self.store,
            NewVehicle {
                owner_id: owner.id,
                vehicle_type: VehicleType::Car,
                can_be_rented: true,
                model: "Lada Vesta".to_string(),
                color: "white".to_string(),
                identifier: format!("V-{}", Uuid::new_v4()),
                description: None,
                latitude: 55.75,
                longitude: 37.61,
                minute_price: minute_price.map(Decimal::from),
                day_price: day_price.map(Decimal::from),
            },
        )
        .await
        .unwrap()
    }

    async fn load_vehicle(&self, id: Uuid) -> Vehicle {
        VehicleDirectory::find_by_id(&self.store, id).await.unwrap().unwrap()
    }

    async fn balance(&self, id: Uuid) -> Decimal {
        AccountLedger::find_by_id(&self.store, id).await.unwrap().unwrap().balance
    }
}

fn rental_error<T: std::fmt::Debug>(result: AppResult<T>) -> RentalError {
    match result {
        Err(AppError::Rental(e)) => e,
        other => panic!("expected a rental error, got {:?}", other),
    }
}

#[tokio::test]
async fn start_snapshots_price_and_locks_vehicle() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let vehicle = w.vehicle(&owner, Some(10), Some(900)).await;

    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();

    assert_eq!(rental.state(), RentalState::Open);
    assert_eq!(rental.price_per_unit, Decimal::from(10));
    assert_eq!(rental.started_at, t0());
    assert!(!w.load_vehicle(vehicle.id).await.can_be_rented);
}

#[tokio::test]
async fn start_rejections() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let other = w.account(1000).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;

    assert_eq!(
        rental_error(w.rentals.start(renter.id, Uuid::new_v4(), RateUnit::Minutes).await),
        RentalError::VehicleNotFound
    );
    assert_eq!(
        rental_error(w.rentals.start(owner.id, vehicle.id, RateUnit::Minutes).await),
        RentalError::SelfRentForbidden
    );
    assert_eq!(
        rental_error(w.rentals.start(renter.id, vehicle.id, RateUnit::Days).await),
        RentalError::RateNotOffered
    );

    // Ninguno de los intentos fallidos dejó el vehículo bloqueado
    assert!(w.load_vehicle(vehicle.id).await.can_be_rented);

    w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();
    assert_eq!(
        rental_error(w.rentals.start(other.id, vehicle.id, RateUnit::Minutes).await),
        RentalError::NotRentable
    );
}

#[tokio::test]
async fn end_charges_rounded_up_units_and_relocates() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(100).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;

    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();
    w.clock.advance(Duration::seconds(61));

    let closed = w.rentals.end(renter.id, rental.id, 55.80, 37.70).await.unwrap();

    assert_eq!(closed.state(), RentalState::Closed);
    assert_eq!(closed.final_price(), Some(Decimal::from(20)));
    assert_eq!(closed.ended_at(), Some(t0() + Duration::seconds(61)));
    assert_eq!(w.balance(renter.id).await, Decimal::from(80));

    let moved = w.load_vehicle(vehicle.id).await;
    assert!(moved.can_be_rented);
    assert_eq!((moved.latitude, moved.longitude), (55.80, 37.70));
}

#[tokio::test]
async fn end_uses_price_captured_at_start() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let vehicle = w.vehicle(&owner, None, Some(300)).await;

    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Days).await.unwrap();

    let mut repriced = w.load_vehicle(vehicle.id).await;
    repriced.day_price = Some(Decimal::from(999));
    VehicleDirectory::save(&w.store, &repriced).await.unwrap();

    w.clock.advance(Duration::hours(30));
    let closed = w.rentals.end(renter.id, rental.id, 55.0, 37.0).await.unwrap();
    assert_eq!(closed.final_price(), Some(Decimal::from(600)));
}

#[tokio::test]
async fn end_with_insufficient_balance_changes_nothing() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(5).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;

    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();
    w.clock.advance(Duration::seconds(30));

    assert_eq!(
        rental_error(w.rentals.end(renter.id, rental.id, 56.0, 38.0).await),
        RentalError::InsufficientBalance
    );

    let stored = RentalRepository::find_by_id(&w.store, rental.id).await.unwrap().unwrap();
    assert!(stored.is_open());
    assert_eq!(w.balance(renter.id).await, Decimal::from(5));
    let untouched = w.load_vehicle(vehicle.id).await;
    assert!(!untouched.can_be_rented);
    assert_eq!((untouched.latitude, untouched.longitude), (55.75, 37.61));
}

#[tokio::test]
async fn end_is_final() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;

    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();
    w.clock.advance(Duration::minutes(3));
    let closed = w.rentals.end(renter.id, rental.id, 55.0, 37.0).await.unwrap();

    w.clock.advance(Duration::minutes(10));
    assert_eq!(
        rental_error(w.rentals.end(renter.id, rental.id, 55.0, 37.0).await),
        RentalError::AlreadyClosed
    );

    let stored = RentalRepository::find_by_id(&w.store, rental.id).await.unwrap().unwrap();
    assert_eq!(stored.final_price(), closed.final_price());
    assert_eq!(w.balance(renter.id).await, Decimal::from(970));
}

#[tokio::test]
async fn end_requires_positive_duration_and_valid_position() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;
    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();

    // Mismo instante que el inicio
    assert_eq!(
        rental_error(w.rentals.end(renter.id, rental.id, 55.0, 37.0).await),
        RentalError::InvalidTimeRange
    );

    w.clock.advance(Duration::seconds(5));
    assert!(matches!(
        w.rentals.end(renter.id, rental.id, 95.0, 37.0).await,
        Err(AppError::Validation(_))
    ));
    assert!(w.rentals.end(renter.id, rental.id, 55.0, 37.0).await.is_ok());
}

#[tokio::test]
async fn only_the_renter_can_end() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;
    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();
    w.clock.advance(Duration::minutes(1));

    assert_eq!(
        rental_error(w.rentals.end(owner.id, rental.id, 55.0, 37.0).await),
        RentalError::RentalNotFound
    );
    assert_eq!(
        rental_error(w.rentals.end(renter.id, Uuid::new_v4(), 55.0, 37.0).await),
        RentalError::RentalNotFound
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_admit_exactly_one() {
    let w = world();
    let owner = w.account(0).await;
    let vehicle_id = w.vehicle(&owner, Some(10), None).await.id;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let renter_id = w.account(1000).await.id;
        let rentals = w.rentals.clone();
        handles.push(tokio::spawn(async move {
            rentals.start(renter_id, vehicle_id, RateUnit::Minutes).await
        }));
    }

    let mut started = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => started += 1,
            Err(AppError::Rental(RentalError::NotRentable)) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(started, 1);
    let history = RentalRepository::find_by_vehicle(&w.store, vehicle_id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].state(), RentalState::Open);
    assert!(!w.load_vehicle(vehicle_id).await.can_be_rented);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_ends_charge_once() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;
    let rental_id = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap().id;
    w.clock.advance(Duration::minutes(2));

    let renter_id = renter.id;
    let a = {
        let rentals = w.rentals.clone();
        tokio::spawn(async move { rentals.end(renter_id, rental_id, 55.0, 37.0).await })
    };
    let b = {
        let rentals = w.rentals.clone();
        tokio::spawn(async move { rentals.end(renter_id, rental_id, 55.0, 37.0).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .any(|r| matches!(r, Err(AppError::Rental(RentalError::AlreadyClosed)))));
    assert_eq!(w.balance(renter.id).await, Decimal::from(980));
}

#[tokio::test]
async fn admin_create_closed_rental_skips_balance_and_vehicle() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(0).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;
    let started_at = t0() - Duration::days(3);

    let rental = w
        .rentals
        .admin_create(AdminRental {
            vehicle_id: vehicle.id,
            renter_id: renter.id,
            started_at,
            ended_at: Some(started_at + Duration::hours(25)),
            rate_unit: RateUnit::Days,
            price_per_unit: Decimal::from(500),
        })
        .await
        .unwrap();

    let expected = pricing_service::price(
        started_at,
        started_at + Duration::hours(25),
        RateUnit::Days,
        Decimal::from(500),
    )
    .unwrap();
    assert_eq!(rental.final_price(), Some(expected));
    assert_eq!(w.balance(renter.id).await, Decimal::ZERO);
    assert!(w.load_vehicle(vehicle.id).await.can_be_rented);

    let fetched = w.rentals.admin_get_rental(rental.id).await.unwrap();
    assert_eq!(fetched, rental);
}

#[tokio::test]
async fn admin_create_closed_rental_requires_rentable_vehicle() {
    let w = world();
    let owner = w.account(0).await;
    let first = w.account(1000).await;
    let second = w.account(0).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;
    let open = w.rentals.start(first.id, vehicle.id, RateUnit::Minutes).await.unwrap();

    let started_at = t0() - Duration::hours(2);
    let result = w
        .rentals
        .admin_create(AdminRental {
            vehicle_id: vehicle.id,
            renter_id: second.id,
            started_at,
            ended_at: Some(started_at + Duration::minutes(10)),
            rate_unit: RateUnit::Minutes,
            price_per_unit: Decimal::from(10),
        })
        .await;

    assert_eq!(rental_error(result), RentalError::NotRentable);
    let history = RentalRepository::find_by_vehicle(&w.store, vehicle.id).await.unwrap();
    assert_eq!(history, vec![open]);
    assert!(!w.load_vehicle(vehicle.id).await.can_be_rented);
}

#[tokio::test]
async fn admin_create_open_rental_takes_the_vehicle() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(0).await;
    let other = w.account(1000).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;

    let request = AdminRental {
        vehicle_id: vehicle.id,
        renter_id: renter.id,
        started_at: t0(),
        ended_at: None,
        rate_unit: RateUnit::Minutes,
        price_per_unit: Decimal::from(3),
    };
    w.rentals.admin_create(request.clone()).await.unwrap();

    assert!(!w.load_vehicle(vehicle.id).await.can_be_rented);
    assert_eq!(
        rental_error(w.rentals.start(other.id, vehicle.id, RateUnit::Minutes).await),
        RentalError::NotRentable
    );
    assert_eq!(
        rental_error(w.rentals.admin_create(request).await),
        RentalError::NotRentable
    );

    let mut unknown_renter = AdminRental {
        vehicle_id: vehicle.id,
        renter_id: Uuid::new_v4(),
        started_at: t0(),
        ended_at: Some(t0() + Duration::minutes(5)),
        rate_unit: RateUnit::Minutes,
        price_per_unit: Decimal::from(3),
    };
    assert_eq!(
        rental_error(w.rentals.admin_create(unknown_renter.clone()).await),
        RentalError::AccountNotFound
    );
    unknown_renter.renter_id = owner.id;
    assert_eq!(
        rental_error(w.rentals.admin_create(unknown_renter).await),
        RentalError::SelfRentForbidden
    );
}

#[tokio::test]
async fn admin_end_follows_end_rules() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(15).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;
    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();

    w.clock.advance(Duration::seconds(90));
    assert_eq!(
        rental_error(w.rentals.admin_end(rental.id, 55.0, 37.0).await),
        RentalError::InsufficientBalance
    );

    let mut topped = AccountLedger::find_by_id(&w.store, renter.id).await.unwrap().unwrap();
    topped.balance = Decimal::from(50);
    AccountLedger::save(&w.store, &topped).await.unwrap();

    let closed = w.rentals.admin_end(rental.id, 55.0, 37.0).await.unwrap();
    assert_eq!(closed.final_price(), Some(Decimal::from(20)));
    assert_eq!(w.balance(renter.id).await, Decimal::from(30));
    assert_eq!(
        rental_error(w.rentals.admin_end(rental.id, 55.0, 37.0).await),
        RentalError::AlreadyClosed
    );
}

#[tokio::test]
async fn admin_update_cannot_reopen() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;
    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();
    w.clock.advance(Duration::minutes(1));
    w.rentals.end(renter.id, rental.id, 55.0, 37.0).await.unwrap();

    let reopen = AdminRental {
        vehicle_id: vehicle.id,
        renter_id: renter.id,
        started_at: t0(),
        ended_at: None,
        rate_unit: RateUnit::Minutes,
        price_per_unit: Decimal::from(10),
    };
    assert_eq!(
        rental_error(w.rentals.admin_update(rental.id, reopen).await),
        RentalError::AlreadyClosed
    );

    // Corregir un alquiler cerrado recalcula el precio sin tocar el saldo
    let corrected = AdminRental {
        vehicle_id: vehicle.id,
        renter_id: renter.id,
        started_at: t0(),
        ended_at: Some(t0() + Duration::minutes(4)),
        rate_unit: RateUnit::Minutes,
        price_per_unit: Decimal::from(10),
    };
    let updated = w.rentals.admin_update(rental.id, corrected).await.unwrap();
    assert_eq!(updated.final_price(), Some(Decimal::from(40)));
    assert_eq!(w.balance(renter.id).await, Decimal::from(990));
}

#[tokio::test]
async fn admin_update_moves_open_rental_between_vehicles() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let first = w.vehicle(&owner, Some(10), None).await;
    let second = w.vehicle(&owner, Some(10), None).await;
    let rental = w.rentals.start(renter.id, first.id, RateUnit::Minutes).await.unwrap();

    let moved = AdminRental {
        vehicle_id: second.id,
        renter_id: renter.id,
        started_at: rental.started_at,
        ended_at: None,
        rate_unit: RateUnit::Minutes,
        price_per_unit: Decimal::from(8),
    };
    let updated = w.rentals.admin_update(rental.id, moved).await.unwrap();

    assert_eq!(updated.vehicle_id, second.id);
    assert!(updated.is_open());
    assert!(w.load_vehicle(first.id).await.can_be_rented);
    assert!(!w.load_vehicle(second.id).await.can_be_rented);

    // Cerrar vía update libera el vehículo actual
    let close = AdminRental {
        vehicle_id: second.id,
        renter_id: renter.id,
        started_at: rental.started_at,
        ended_at: Some(rental.started_at + Duration::minutes(2)),
        rate_unit: RateUnit::Minutes,
        price_per_unit: Decimal::from(8),
    };
    let closed = w.rentals.admin_update(rental.id, close).await.unwrap();
    assert_eq!(closed.final_price(), Some(Decimal::from(16)));
    assert!(w.load_vehicle(second.id).await.can_be_rented);
}

#[tokio::test]
async fn admin_delete_of_open_rental_frees_vehicle() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;
    let rental = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();

    w.rentals.admin_delete(rental.id).await.unwrap();

    assert!(w.load_vehicle(vehicle.id).await.can_be_rented);
    assert_eq!(
        rental_error(w.rentals.admin_get_rental(rental.id).await),
        RentalError::RentalNotFound
    );
    assert_eq!(
        rental_error(w.rentals.admin_delete(rental.id).await),
        RentalError::RentalNotFound
    );
}

#[tokio::test]
async fn rental_queries_respect_ownership() {
    let w = world();
    let owner = w.account(0).await;
    let renter = w.account(1000).await;
    let stranger = w.account(0).await;
    let vehicle = w.vehicle(&owner, Some(10), None).await;

    let first = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();
    w.clock.advance(Duration::minutes(1));
    w.rentals.end(renter.id, first.id, 55.0, 37.0).await.unwrap();
    w.clock.advance(Duration::minutes(1));
    let second = w.rentals.start(renter.id, vehicle.id, RateUnit::Minutes).await.unwrap();

    assert_eq!(w.rentals.get_rental(renter.id, first.id).await.unwrap().id, first.id);
    assert_eq!(w.rentals.get_rental(owner.id, first.id).await.unwrap().id, first.id);
    assert_eq!(
        rental_error(w.rentals.get_rental(stranger.id, first.id).await),
        RentalError::RentalNotFound
    );

    let history = w.rentals.renter_history(renter.id).await.unwrap();
    let ids: Vec<Uuid> = history.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(w.rentals.renter_history(stranger.id).await.unwrap().is_empty());

    assert_eq!(w.rentals.vehicle_history(owner.id, vehicle.id).await.unwrap().len(), 2);
    assert_eq!(
        rental_error(w.rentals.vehicle_history(renter.id, vehicle.id).await),
        RentalError::VehicleNotFound
    );

    assert_eq!(w.rentals.admin_vehicle_history(vehicle.id).await.unwrap().len(), 2);
    assert_eq!(
        rental_error(w.rentals.admin_renter_history(Uuid::new_v4()).await),
        RentalError::AccountNotFound
    );
    assert_eq!(
        rental_error(w.rentals.admin_vehicle_history(Uuid::new_v4()).await),
        RentalError::VehicleNotFound
    );
}
