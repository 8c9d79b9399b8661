//! The calling role, taken from the `x-campus-role` header.
//!
//! Authentication happens in front of this service. A request without the
//! header comes from a trusted back-office caller and is not restricted.

use axum::{extract::FromRequestParts, http::request::Parts};
use campus_core::access::{Operation, Role};

use crate::error::ApiError;

pub const ROLE_HEADER: &str = "x-campus-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
  pub role: Option<Role>,
}

impl Caller {
  pub fn require(&self, op: Operation) -> Result<(), ApiError> {
    match self.role {
      Some(role) if !role.permits(op) => {
        Err(ApiError::Forbidden(format!("role {role} may not perform {op:?}")))
      }
      _ => Ok(()),
    }
  }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    let Some(value) = parts.headers.get(ROLE_HEADER) else {
      return Ok(Caller { role: None });
    };
    let raw = value
      .to_str()
      .map_err(|_| ApiError::BadRequest(format!("{ROLE_HEADER} is not valid text")))?;
    let role = raw
      .trim()
      .parse::<Role>()
      .map_err(|_| ApiError::BadRequest(format!("unknown role {raw:?}")))?;
    Ok(Caller { role: Some(role) })
  }
}
