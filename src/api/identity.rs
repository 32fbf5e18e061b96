use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::error::CheckoutError;
use crate::services::Caller;

pub const USER_HEADER: &str = "X-User-Id";
pub const ROLE_HEADER: &str = "X-User-Role";
pub const BACK_OFFICE_ROLE: &str = "back-office";

/// Authenticated caller, resolved from the session gateway's user headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    id: String,
    back_office: bool,
}

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn caller(&self) -> Caller {
        if self.back_office {
            Caller::BackOffice(self.id.clone())
        } else {
            Caller::Customer(self.id.clone())
        }
    }
}

fn header<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

impl FromRequest for CurrentUser {
    type Error = CheckoutError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = header(req, USER_HEADER)
            .map(|id| CurrentUser {
                id: id.to_string(),
                back_office: header(req, ROLE_HEADER)
                    .is_some_and(|role| role.eq_ignore_ascii_case(BACK_OFFICE_ROLE)),
            })
            .ok_or(CheckoutError::Unauthenticated);

        ready(user)
    }
}
