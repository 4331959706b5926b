//! Client side of the city editor: a typed API service over an explicitly passed
//! [`RequestExecutor`], the duplicate-check validator and the edit form state machine.

pub mod dupe;
pub mod executor;
pub mod form;
pub mod service;

pub use dupe::{DupeCheckValidator, DupeStatus};
pub use executor::{
    ApiRequest, ApiResponse, ClientError, ClientResult, HttpExecutor, RequestExecutor,
};
pub use form::{CityEditForm, Field, FieldError, FormError, FormMode, FormState};
pub use service::CityService;
