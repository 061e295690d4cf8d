use log::{debug, error};
use okapi::openapi3::Responses;
use rocket::http::Status as HttpStatus;
use rocket::response::status::Custom;
use rocket::response::{self, Responder};
use rocket::Request;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::response::OpenApiResponderInner;
use rocket_okapi::util::add_schema_response;
use thiserror::Error;

use crate::status_messages::{new_status, Status};

/// Every failure an engine or handler can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortalError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("Access denied")]
    Forbidden,

    #[error("{0}")]
    Validation(String),

    #[error("Insufficient coins")]
    InsufficientFunds,

    #[error("Invalid pack type: {0}")]
    InvalidPackType(String),

    #[error("You do not own this Pokemon")]
    NotOwned,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Auction is no longer active")]
    NotActive,

    #[error("Cannot bid on own auction")]
    SelfBid,

    #[error("Bid must be higher than current price")]
    BidTooLow,

    #[error("Level not reached yet")]
    LevelNotReached,

    #[error("Reward already claimed")]
    AlreadyClaimed,

    #[error("No reward for this level")]
    NoRewardAtLevel,

    #[error("Store error: {0}")]
    Store(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type PortalResult<T> = Result<T, PortalError>;

impl PortalError {
    pub fn status(&self) -> HttpStatus {
        match self {
            PortalError::Unauthorized => HttpStatus::Unauthorized,
            PortalError::Forbidden => HttpStatus::Forbidden,
            PortalError::NotFound(_) => HttpStatus::NotFound,
            PortalError::Store(_) | PortalError::Internal(_) => HttpStatus::InternalServerError,
            _ => HttpStatus::BadRequest,
        }
    }

    /// Message safe to hand to a client; internal detail stays in the log.
    pub fn public_message(&self) -> String {
        match self {
            PortalError::Store(_) | PortalError::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(e: serde_json::Error) -> Self {
        PortalError::Store(e.to_string())
    }
}

impl<'r> Responder<'r, 'static> for PortalError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            error!("{} {} failed: {}", req.method(), req.uri(), self);
        } else {
            debug!("{} {} rejected: {}", req.method(), req.uri(), self);
        }
        Custom(status, new_status(self.public_message())).respond_to(req)
    }
}

impl OpenApiResponderInner for PortalError {
    fn responses(gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();
        let schema = gen.json_schema::<Status>();
        for code in [400u16, 401, 403, 404, 500] {
            add_schema_response(&mut responses, code, "application/json", schema.clone())?;
        }
        Ok(responses)
    }
}
