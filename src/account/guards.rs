use log::warn;
use rocket::http::Status as HttpStatus;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};

use crate::account::Role;
use crate::error::PortalError;
use crate::identity::Identity;
use crate::portal::Portal;

/// Caller authenticated through `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

/// Authenticated caller whose account carries the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Identity);

fn bearer_token<'a>(req: &'a Request<'_>) -> Option<&'a str> {
    req.headers()
        .get_one("Authorization")
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthUser {
    type Error = PortalError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let Some(portal) = req.rocket().state::<Portal>() else {
            return Outcome::Error((
                HttpStatus::InternalServerError,
                PortalError::Internal("portal state not managed".into()),
            ));
        };
        let Some(token) = bearer_token(req) else {
            return Outcome::Error((HttpStatus::Unauthorized, PortalError::Unauthorized));
        };
        match portal.identity.resolve(token).await {
            Some(identity) => Outcome::Success(AuthUser(identity)),
            None => Outcome::Error((HttpStatus::Unauthorized, PortalError::Unauthorized)),
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminUser {
    type Error = PortalError;

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let identity = match AuthUser::from_request(req).await {
            Outcome::Success(AuthUser(identity)) => identity,
            Outcome::Error(e) => return Outcome::Error(e),
            Outcome::Forward(s) => return Outcome::Forward(s),
        };
        let Some(portal) = req.rocket().state::<Portal>() else {
            return Outcome::Error((
                HttpStatus::InternalServerError,
                PortalError::Internal("portal state not managed".into()),
            ));
        };
        match portal.accounts.get(&identity.id).await {
            Ok(Some(account)) if account.role == Role::Admin => Outcome::Success(AdminUser(identity)),
            Ok(_) => {
                warn!("non-admin {} attempted {} {}", identity.id, req.method(), req.uri());
                Outcome::Error((HttpStatus::Forbidden, PortalError::Forbidden))
            }
            Err(e) => Outcome::Error((HttpStatus::InternalServerError, e)),
        }
    }
}

fn bearer_security() -> RequestHeaderInput {
    let scheme = SecurityScheme {
        description: Some("Access token issued at signup.".to_owned()),
        data: SecuritySchemeData::Http {
            scheme: "bearer".to_owned(),
            bearer_format: Some("opaque".to_owned()),
        },
        extensions: Object::default(),
    };
    let mut requirement = SecurityRequirement::new();
    requirement.insert("BearerAuth".to_owned(), Vec::new());
    RequestHeaderInput::Security("BearerAuth".to_owned(), scheme, requirement)
}

impl<'r> OpenApiFromRequest<'r> for AuthUser {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(bearer_security())
    }
}

impl<'r> OpenApiFromRequest<'r> for AdminUser {
    fn from_request_input(
        _gen: &mut OpenApiGenerator,
        _name: String,
        _required: bool,
    ) -> rocket_okapi::Result<RequestHeaderInput> {
        Ok(bearer_security())
    }
}
