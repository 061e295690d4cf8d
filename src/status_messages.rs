use rocket::http::Status as HttpStatus;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::Request;
use rocket_okapi::JsonSchema;

/// Body of every non-2xx response.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Status {
    pub error: String,
}

pub fn new_status(error: impl Into<String>) -> Json<Status> {
    Json(Status {
        error: error.into(),
    })
}

#[catch(400)]
pub fn bad_request() -> Json<Status> {
    new_status("Bad request")
}

#[catch(401)]
pub fn unauthorized() -> Json<Status> {
    new_status("Unauthorized")
}

#[catch(403)]
pub fn forbidden() -> Json<Status> {
    new_status("Access denied")
}

#[catch(404)]
pub fn not_found(req: &Request) -> Json<Status> {
    new_status(format!("Route {} not found", req.uri().path()))
}

/// Rocket answers undecodable JSON bodies with 422; clients of this API get 400.
#[catch(422)]
pub fn unprocessable() -> Custom<Json<Status>> {
    Custom(HttpStatus::BadRequest, new_status("Malformed request body"))
}

#[catch(500)]
pub fn internal_error() -> Json<Status> {
    new_status("Internal server error")
}
