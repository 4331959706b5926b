use std::net::SocketAddr;

use tokio::net::TcpListener;

use world_cities::client::form::CITIES_ROUTE;
use world_cities::client::{
    CityEditForm, CityService, DupeStatus, FormError, FormMode, FormState, HttpExecutor,
};
use world_cities::dto::{PageRequest, SortOrder};
use world_cities::routes::create_router;
use world_cities::test_support::{insert_city, insert_country, test_state};

/// Serve the API on an ephemeral port and return a client pointed at it.
async fn spawn_api() -> (CityService<HttpExecutor>, i32) {
    let state = test_state().await;
    let country_id = insert_country(&state.db, "Italy", "IT", "ITA").await;
    insert_country(&state.db, "France", "FR", "FRA").await;
    insert_city(&state.db, "Rome", 41.8933, 12.4829, country_id).await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let app = create_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let executor = HttpExecutor::new(format!("http://{}", addr)).unwrap();
    (CityService::new(executor), country_id)
}

#[tokio::test]
async fn create_city_through_the_form() {
    let (service, country_id) = spawn_api().await;

    let mut form = CityEditForm::new(service.clone(), None);
    assert_eq!(form.mode(), FormMode::Create);
    assert_eq!(form.title(), "Create a new City");

    form.load().await.unwrap();
    assert_eq!(form.state(), FormState::Ready { dirty: false });
    assert_eq!(form.countries().len(), 2);

    form.set_name("Milan").unwrap();
    form.set_lat("45.4669").unwrap();
    form.set_lon("9.19").unwrap();
    form.set_country_id(country_id).unwrap();
    assert!(form.is_dirty());

    assert_eq!(form.check_duplicate().await, Some(DupeStatus::Unique));

    let created = form.submit().await.unwrap();
    assert!(created.id > 0);
    assert_eq!(form.state(), FormState::Submitted);
    assert_eq!(form.navigate_to(), Some(CITIES_ROUTE));

    let stored = service.get_city(created.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Milan");
    assert_eq!(stored.country_id, country_id);

    let page = PageRequest::new(0, 10)
        .sorted_by("name", SortOrder::Asc)
        .filtered_by("name", "M");
    let cities = service.get_cities(&page).await.unwrap();
    assert_eq!(cities.total_count, 1);
    assert_eq!(cities.data[0].id, created.id);
}

#[tokio::test]
async fn duplicate_city_is_not_submitted() {
    let (service, country_id) = spawn_api().await;

    let mut form = CityEditForm::new(service.clone(), Some("0"));
    form.load().await.unwrap();
    form.set_name("Rome").unwrap();
    form.set_lat("41.9").unwrap();
    form.set_lon("12.5").unwrap();
    form.set_country_id(country_id).unwrap();

    assert!(matches!(form.submit().await, Err(FormError::Duplicate)));
    assert_eq!(form.navigate_to(), None);
    assert!(form.last_error().is_some());

    // Same name in another country is fine
    let other = form
        .countries()
        .iter()
        .find(|c| c.id != country_id)
        .map(|c| c.id)
        .unwrap();
    form.set_country_id(other).unwrap();
    let created = form.submit().await.unwrap();
    assert_eq!(created.country_id, other);
    assert_eq!(form.navigate_to(), Some(CITIES_ROUTE));

    let all = service.get_cities(&PageRequest::new(0, 10)).await.unwrap();
    assert_eq!(all.total_count, 2);
}

#[tokio::test]
async fn server_rejection_keeps_form_editable() {
    let (service, _) = spawn_api().await;

    let mut form = CityEditForm::new(service, None);
    form.load().await.unwrap();
    form.set_name("Atlantis").unwrap();
    form.set_lat("10").unwrap();
    form.set_lon("10").unwrap();
    // Passes the local checks but does not exist on the server
    form.set_country_id(9999).unwrap();

    let err = form.submit().await.unwrap_err();

    assert!(matches!(err, FormError::Request(_)));
    assert_eq!(form.state(), FormState::Ready { dirty: true });
    assert!(form.last_error().unwrap().contains("Invalid country"));
    assert_eq!(form.navigate_to(), None);

    form.set_name("Atlantis II").unwrap();
    assert!(form.is_dirty());
}
