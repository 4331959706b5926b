use std::fmt;
use std::future::Future;

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::client::dupe::{DupeCheckValidator, DupeStatus};
use crate::client::executor::{ClientError, RequestExecutor};
use crate::client::service::CityService;
use crate::dto::{CityDto, PageRequest, SortOrder};
use crate::entities::{city, country};

lazy_static! {
    /// Optional minus sign, digits, and at most four fractional digits.
    /// - Valid: "45", "-6.2088", "0.5"
    /// - Invalid: "1.23456", "1.", "+3", "abc"
    static ref COORDINATE_REGEX: Regex = Regex::new(r"^[-]?[0-9]+(\.[0-9]{1,4})?$").unwrap();
}

/// Where the form navigates after a successful submit.
pub const CITIES_ROUTE: &str = "/cities";

/// Page size used to fetch every country for the pick-list.
pub const COUNTRY_PICKLIST_SIZE: u64 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i32),
}

impl FormMode {
    /// Absent, empty, non-numeric and zero ids all select create mode.
    pub fn from_route_param(id: Option<&str>) -> Self {
        match id.and_then(|raw| raw.trim().parse::<i32>().ok()) {
            Some(id) if id != 0 => FormMode::Edit(id),
            _ => FormMode::Create,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    LoadingCountries,
    Ready { dirty: bool },
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Lat,
    Lon,
    CountryId,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Field::Name => "Name",
            Field::Lat => "Latitude",
            Field::Lon => "Longitude",
            Field::CountryId => "Country",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// Raw control values, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CityFormValues {
    pub name: String,
    pub lat: String,
    pub lon: String,
    pub country_id: String,
}

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Form is not ready ({0:?})")]
    NotReady(FormState),

    #[error("City {0} not found")]
    NotFound(i32),

    #[error("Invalid input: {}", describe(.0))]
    Invalid(Vec<FieldError>),

    #[error("A city with this name already exists in the selected country")]
    Duplicate,

    #[error("Duplicate check failed: {0}")]
    DupeCheckFailed(String),

    #[error(transparent)]
    Request(#[from] ClientError),
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Create/edit form for a single city.
///
/// `LoadingCountries -> Ready { dirty } -> Submitting -> Submitted`. Failed submits go
/// back to `Ready { dirty: true }` with the error kept in [`last_error`](Self::last_error).
pub struct CityEditForm<E> {
    service: CityService<E>,
    validator: DupeCheckValidator,
    mode: FormMode,
    state: FormState,
    title: String,
    values: CityFormValues,
    countries: Vec<country::Model>,
    city: Option<city::Model>,
    dupe_status: Option<DupeStatus>,
    last_error: Option<String>,
    navigate_to: Option<&'static str>,
}

impl<E: RequestExecutor> CityEditForm<E> {
    pub fn new(service: CityService<E>, route_id: Option<&str>) -> Self {
        let mode = FormMode::from_route_param(route_id);
        let title = match mode {
            FormMode::Create => "Create a new City".to_string(),
            FormMode::Edit(_) => "Edit City".to_string(),
        };

        Self {
            service,
            validator: DupeCheckValidator::new(),
            mode,
            state: FormState::LoadingCountries,
            title,
            values: CityFormValues::default(),
            countries: Vec::new(),
            city: None,
            dupe_status: None,
            last_error: None,
            navigate_to: None,
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        matches!(self.state, FormState::Ready { dirty: true })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn values(&self) -> &CityFormValues {
        &self.values
    }

    pub fn countries(&self) -> &[country::Model] {
        &self.countries
    }

    pub fn city(&self) -> Option<&city::Model> {
        self.city.as_ref()
    }

    pub fn dupe_status(&self) -> Option<&DupeStatus> {
        self.dupe_status.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn navigate_to(&self) -> Option<&'static str> {
        self.navigate_to
    }

    /// Fetch the country pick-list and, in edit mode, the city being edited.
    ///
    /// The form is `Ready { dirty: false }` afterwards even when loading failed, so the
    /// user can still work with it.
    pub async fn load(&mut self) -> Result<(), FormError> {
        self.state = FormState::LoadingCountries;
        let result = self.fetch_initial_data().await;
        self.state = FormState::Ready { dirty: false };

        result.map_err(|e| self.failed(e))
    }

    async fn fetch_initial_data(&mut self) -> Result<(), FormError> {
        let picklist = PageRequest::new(0, COUNTRY_PICKLIST_SIZE).sorted_by("name", SortOrder::Asc);
        self.countries = self.service.get_countries(&picklist).await?.data;

        if let FormMode::Edit(id) = self.mode {
            let city = self
                .service
                .get_city(id)
                .await?
                .ok_or(FormError::NotFound(id))?;

            self.title = format!("Edit - {}", city.name);
            self.values = CityFormValues {
                name: city.name.clone(),
                lat: city.lat.to_string(),
                lon: city.lon.to_string(),
                country_id: city.country_id.to_string(),
            };
            self.city = Some(city);
            self.log_change(Field::Name, false);
        }
        Ok(())
    }

    /// Apply a user edit. Changing the name or country invalidates any duplicate check.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<(), FormError> {
        if !matches!(self.state, FormState::Ready { .. }) {
            return Err(FormError::NotReady(self.state));
        }

        let value = value.into();
        match field {
            Field::Name => self.values.name = value,
            Field::Lat => self.values.lat = value,
            Field::Lon => self.values.lon = value,
            Field::CountryId => self.values.country_id = value,
        }

        if matches!(field, Field::Name | Field::CountryId) {
            self.validator.invalidate();
            self.dupe_status = None;
        }

        self.state = FormState::Ready { dirty: true };
        self.log_change(field, true);
        Ok(())
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), FormError> {
        self.set_field(Field::Name, name)
    }

    pub fn set_lat(&mut self, lat: &str) -> Result<(), FormError> {
        self.set_field(Field::Lat, lat)
    }

    pub fn set_lon(&mut self, lon: &str) -> Result<(), FormError> {
        self.set_field(Field::Lon, lon)
    }

    pub fn set_country_id(&mut self, country_id: i32) -> Result<(), FormError> {
        self.set_field(Field::CountryId, country_id.to_string())
    }

    fn log_change(&self, field: Field, by_user: bool) {
        if by_user {
            tracing::info!("Form was updated by the user.");
            if field == Field::Name {
                tracing::info!("Name was updated by the user.");
            }
        } else {
            tracing::info!("Form Model has been loaded.");
            if field == Field::Name {
                tracing::info!("Name has been loaded with initial values.");
            }
        }
    }

    /// Synchronous checks on the raw control values.
    pub fn validate_fields(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if self.values.name.trim().is_empty() {
            errors.push(required(Field::Name));
        }

        for (field, raw) in [(Field::Lat, &self.values.lat), (Field::Lon, &self.values.lon)] {
            let raw = raw.trim();
            if raw.is_empty() {
                errors.push(required(field));
            } else if !COORDINATE_REGEX.is_match(raw) {
                errors.push(FieldError {
                    field,
                    message: format!("{} requires a number with up to 4 decimal places", field),
                });
            }
        }

        match self.values.country_id.trim() {
            "" => errors.push(required(Field::CountryId)),
            raw if !raw.parse::<i32>().is_ok_and(|id| id > 0) => errors.push(FieldError {
                field: Field::CountryId,
                message: "Country is invalid".to_string(),
            }),
            _ => {}
        }

        errors
    }

    /// The current values as a request body. Unparsable numbers become zero, which the
    /// server rejects or never matches.
    pub fn candidate(&self) -> CityDto {
        CityDto {
            id: match self.mode {
                FormMode::Edit(id) => id,
                FormMode::Create => 0,
            },
            name: self.values.name.trim().to_string(),
            lat: self.values.lat.trim().parse().unwrap_or(0.0),
            lon: self.values.lon.trim().parse().unwrap_or(0.0),
            country_id: self.values.country_id.trim().parse().unwrap_or(0),
        }
    }

    /// A detached duplicate check for the current values.
    ///
    /// The future owns what it needs, so callers may start it and keep editing. Feed the
    /// result to [`apply_dupe_check`](Self::apply_dupe_check); a check overtaken by a
    /// newer one or by an edit resolves to `None`.
    pub fn dupe_check(&self) -> impl Future<Output = Option<DupeStatus>> + Send + 'static {
        let service = self.service.clone();
        let validator = self.validator.clone();
        let candidate = self.candidate();
        let ticket = validator.issue_ticket();

        async move {
            validator
                .check_with_ticket(ticket, &service, &candidate)
                .await
        }
    }

    pub fn apply_dupe_check(&mut self, status: Option<DupeStatus>) {
        let Some(status) = status else {
            return;
        };

        if let DupeStatus::Error(message) = &status {
            self.last_error = Some(format!("Duplicate check failed: {}", message));
        }
        self.dupe_status = Some(status);
    }

    /// Run a duplicate check for the current values and record its result.
    pub async fn check_duplicate(&mut self) -> Option<DupeStatus> {
        let status = self.dupe_check().await;
        self.apply_dupe_check(status.clone());
        status
    }

    /// Validate, re-check for duplicates, then create or update the city.
    ///
    /// Navigation to [`CITIES_ROUTE`] is only recorded when the server accepted the record.
    pub async fn submit(&mut self) -> Result<city::Model, FormError> {
        if !matches!(self.state, FormState::Ready { .. }) {
            return Err(FormError::NotReady(self.state));
        }

        let errors = self.validate_fields();
        if !errors.is_empty() {
            return Err(self.rejected(FormError::Invalid(errors)));
        }

        match self.check_duplicate().await {
            Some(DupeStatus::Unique) => {}
            Some(DupeStatus::Duplicate) => return Err(self.rejected(FormError::Duplicate)),
            Some(DupeStatus::Error(message)) => {
                return Err(self.rejected(FormError::DupeCheckFailed(message)));
            }
            None => {
                return Err(self.rejected(FormError::DupeCheckFailed(
                    "superseded by a newer check".to_string(),
                )));
            }
        }

        let candidate = self.candidate();
        self.state = FormState::Submitting;

        let result = match self.mode {
            FormMode::Create => self.service.post(&candidate).await,
            FormMode::Edit(_) => self.service.put(&candidate).await,
        };

        match result {
            Ok(city) => {
                match self.mode {
                    FormMode::Create => tracing::info!("City {} has been created.", city.id),
                    FormMode::Edit(_) => tracing::info!("City {} has been updated.", city.id),
                }
                self.city = Some(city.clone());
                self.last_error = None;
                self.state = FormState::Submitted;
                self.navigate_to = Some(CITIES_ROUTE);
                Ok(city)
            }
            Err(e) => Err(self.rejected(e.into())),
        }
    }

    /// A failed submit leaves the form editable and dirty.
    fn rejected(&mut self, error: FormError) -> FormError {
        self.state = FormState::Ready { dirty: true };
        self.failed(error)
    }

    fn failed(&mut self, error: FormError) -> FormError {
        tracing::error!("{}", error);
        self.last_error = Some(error.to_string());
        error
    }
}

fn required(field: Field) -> FieldError {
    FieldError {
        field,
        message: format!("{} is required", field),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;
    use crate::client::executor::{ApiRequest, ApiResponse, ClientResult};
    use crate::test_support::{insert_city, insert_country, test_state, RouterExecutor};

    /// Serves the country list and refuses everything else.
    struct DownstreamFailure;

    impl RequestExecutor for DownstreamFailure {
        async fn execute(&self, request: ApiRequest) -> ClientResult<ApiResponse> {
            if request.path == "/api/Countries" {
                return ApiResponse::from_json(
                    StatusCode::OK,
                    &serde_json::json!({
                        "data": [{ "id": 1, "name": "Testland", "iso2": "TL", "iso3": "TST" }],
                        "pageIndex": 0, "pageSize": 9999, "totalCount": 1, "totalPages": 1,
                        "sortColumn": "name", "sortOrder": "asc",
                        "filterColumn": null, "filterQuery": null
                    }),
                );
            }
            Err(ClientError::Transport("connection reset".to_string()))
        }
    }

    async fn fixture() -> (CityService<RouterExecutor>, i32, i32) {
        let state = test_state().await;
        let country_id = insert_country(&state.db, "Testland", "TL", "TST").await;
        insert_country(&state.db, "Abroad", "AB", "ABR").await;
        let city_id = insert_city(&state.db, "TestCity1", 1.5, -2.25, country_id).await;
        (CityService::new(RouterExecutor::new(state)), country_id, city_id)
    }

    #[test]
    fn test_mode_from_route_param() {
        assert_eq!(FormMode::from_route_param(None), FormMode::Create);
        assert_eq!(FormMode::from_route_param(Some("")), FormMode::Create);
        assert_eq!(FormMode::from_route_param(Some("0")), FormMode::Create);
        assert_eq!(FormMode::from_route_param(Some("abc")), FormMode::Create);
        assert_eq!(FormMode::from_route_param(Some("42")), FormMode::Edit(42));
    }

    #[test]
    fn test_coordinate_pattern() {
        for valid in ["45", "-6.2088", "0.5", "180"] {
            assert!(COORDINATE_REGEX.is_match(valid), "{}", valid);
        }
        for invalid in ["1.23456", "1.", "+3", "abc", ""] {
            assert!(!COORDINATE_REGEX.is_match(invalid), "{}", invalid);
        }
    }

    #[tokio::test]
    async fn test_load_existing_city_is_not_dirty() {
        let (service, country_id, city_id) = fixture().await;
        let route_id = city_id.to_string();
        let mut form = CityEditForm::new(service, Some(&route_id));
        assert_eq!(form.state(), FormState::LoadingCountries);

        form.load().await.unwrap();

        assert_eq!(form.state(), FormState::Ready { dirty: false });
        assert_eq!(form.title(), "Edit - TestCity1");
        assert_eq!(form.values().name, "TestCity1");
        assert_eq!(form.values().lat, "1.5");
        assert_eq!(form.values().country_id, country_id.to_string());
        let names: Vec<&str> = form.countries().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Abroad", "Testland"]);

        form.set_lon("-2.5").unwrap();
        assert!(form.is_dirty());
    }

    #[tokio::test]
    async fn test_missing_city_surfaces_error() {
        let (service, _, city_id) = fixture().await;
        let route_id = (city_id + 100).to_string();
        let mut form = CityEditForm::new(service, Some(&route_id));

        let err = form.load().await.unwrap_err();

        assert!(matches!(err, FormError::NotFound(_)));
        assert_eq!(form.state(), FormState::Ready { dirty: false });
        assert!(form.last_error().is_some());
    }

    #[tokio::test]
    async fn test_edits_before_load_are_rejected() {
        let (service, _, _) = fixture().await;
        let mut form = CityEditForm::new(service, None);

        assert!(matches!(
            form.set_name("Early"),
            Err(FormError::NotReady(FormState::LoadingCountries))
        ));
    }

    #[tokio::test]
    async fn test_field_validation_blocks_submit() {
        let (service, _, _) = fixture().await;
        let mut form = CityEditForm::new(service, None);
        form.load().await.unwrap();

        form.set_name("Somewhere").unwrap();
        form.set_lat("12.345678").unwrap();

        match form.submit().await {
            Err(FormError::Invalid(errors)) => {
                let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec![Field::Lat, Field::Lon, Field::CountryId]);
            }
            other => panic!("unexpected result: {:?}", other.map(|c| c.id)),
        }
        assert_eq!(form.navigate_to(), None);
        assert!(form.is_dirty());
    }

    #[tokio::test]
    async fn test_duplicate_blocks_submit_and_edit_is_not_its_own_dupe() {
        let (service, country_id, city_id) = fixture().await;

        let mut create = CityEditForm::new(service.clone(), None);
        create.load().await.unwrap();
        create.set_name("TestCity1").unwrap();
        create.set_lat("3").unwrap();
        create.set_lon("4").unwrap();
        create.set_country_id(country_id).unwrap();

        assert!(matches!(create.submit().await, Err(FormError::Duplicate)));
        assert_eq!(create.dupe_status(), Some(&DupeStatus::Duplicate));
        assert_eq!(create.state(), FormState::Ready { dirty: true });
        assert_eq!(create.navigate_to(), None);

        let route_id = city_id.to_string();
        let mut edit = CityEditForm::new(service, Some(&route_id));
        edit.load().await.unwrap();
        assert_eq!(edit.check_duplicate().await, Some(DupeStatus::Unique));

        edit.set_lat("1.75").unwrap();
        let updated = edit.submit().await.unwrap();
        assert_eq!(updated.id, city_id);
        assert_eq!(updated.lat, 1.75);
        assert_eq!(edit.state(), FormState::Submitted);
        assert_eq!(edit.navigate_to(), Some(CITIES_ROUTE));
    }

    #[tokio::test]
    async fn test_name_change_discards_pending_check() {
        let (service, country_id, _) = fixture().await;
        let mut form = CityEditForm::new(service, None);
        form.load().await.unwrap();
        form.set_name("TestCity1").unwrap();
        form.set_country_id(country_id).unwrap();

        let pending = form.dupe_check();
        form.set_name("Elsewhere").unwrap();
        let stale = pending.await;
        form.apply_dupe_check(stale.clone());

        assert_eq!(stale, None);
        assert_eq!(form.dupe_status(), None);
    }

    #[tokio::test]
    async fn test_country_change_discards_pending_check() {
        let (service, country_id, _) = fixture().await;
        let mut form = CityEditForm::new(service, None);
        form.load().await.unwrap();
        form.set_name("TestCity1").unwrap();
        form.set_country_id(country_id).unwrap();

        let pending = form.dupe_check();
        form.set_country_id(country_id + 1).unwrap();
        let stale = pending.await;
        form.apply_dupe_check(stale.clone());

        assert_eq!(stale, None);
        assert_eq!(form.dupe_status(), None);
        assert_eq!(form.check_duplicate().await, Some(DupeStatus::Unique));
    }

    #[tokio::test]
    async fn test_rejected_submit_of_untouched_form_is_dirty() {
        let (service, _, _) = fixture().await;
        let mut form = CityEditForm::new(service, None);
        form.load().await.unwrap();
        assert_eq!(form.state(), FormState::Ready { dirty: false });

        let err = form.submit().await.unwrap_err();

        assert!(matches!(err, FormError::Invalid(_)));
        assert_eq!(form.state(), FormState::Ready { dirty: true });
        assert!(form.last_error().unwrap().contains("Name is required"));
    }

    #[tokio::test]
    async fn test_failed_dupe_check_blocks_submit() {
        let mut form = CityEditForm::new(CityService::new(DownstreamFailure), None);
        form.load().await.unwrap();
        form.set_name("Anywhere").unwrap();
        form.set_lat("1").unwrap();
        form.set_lon("1").unwrap();
        form.set_country_id(1).unwrap();

        let err = form.submit().await.unwrap_err();

        assert!(matches!(err, FormError::DupeCheckFailed(_)));
        assert!(matches!(form.dupe_status(), Some(DupeStatus::Error(_))));
        assert_eq!(form.state(), FormState::Ready { dirty: true });
        assert!(form.last_error().unwrap().contains("connection reset"));
        assert_eq!(form.navigate_to(), None);
    }
}
