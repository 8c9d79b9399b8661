//! The `{success, data | message}` body every successful response uses.

use axum::{
  Json,
  response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  data:    Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  message: Option<String>,
}

impl<T> Envelope<T> {
  pub fn data(data: T) -> Self {
    Self { success: true, data: Some(data), message: None }
  }
}

impl Envelope<()> {
  pub fn message(message: impl Into<String>) -> Self {
    Self { success: true, data: None, message: Some(message.into()) }
  }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
  fn into_response(self) -> Response { Json(self).into_response() }
}
