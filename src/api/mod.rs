pub mod request;
pub mod response;
pub mod routes;

pub use request::{FeeRequest, RequestError, ValidateRequest};
pub use response::{ErrorResponse, FeeResponse, ValidateResponse};
pub use routes::{create_router, AppState};
