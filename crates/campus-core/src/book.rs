//! Book records in the inventory catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A catalogued title and its copy counts.
///
/// Invariant: `available_copies <= total_copies`. Only the circulation ledger
/// moves `available_copies`; `total_copies` changes on loss, recovery, or an
/// explicit catalog edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
  pub book_id:          String,
  pub title:            String,
  pub author:           String,
  pub price:            Decimal,
  pub total_copies:     u32,
  pub available_copies: u32,
  pub added_at:         DateTime<Utc>,
}

impl Book {
  /// Copies currently out on active loans.
  pub fn on_loan(&self) -> u32 {
    self.total_copies.saturating_sub(self.available_copies)
  }
}

/// Input to [`crate::store::CampusStore::add_book`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
  pub book_id:      String,
  pub title:        String,
  pub author:       String,
  pub price:        Decimal,
  pub total_copies: u32,
}

impl NewBook {
  pub fn validate(&self) -> Result<()> {
    require_text("book id", &self.book_id)?;
    require_text("title", &self.title)?;
    require_text("author", &self.author)?;
    validate_price(self.price)?;
    if self.total_copies == 0 {
      return Err(Error::InvalidInput("total copies must be positive".into()));
    }
    Ok(())
  }
}

/// Partial catalog edit accepted by
/// [`crate::store::CampusStore::update_book`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookUpdate {
  pub title:        Option<String>,
  pub author:       Option<String>,
  pub price:        Option<Decimal>,
  pub total_copies: Option<u32>,
}

impl BookUpdate {
  pub fn validate(&self) -> Result<()> {
    if let Some(title) = &self.title {
      require_text("title", title)?;
    }
    if let Some(author) = &self.author {
      require_text("author", author)?;
    }
    if let Some(price) = self.price {
      validate_price(price)?;
    }
    if self.total_copies == Some(0) {
      return Err(Error::InvalidInput("total copies must be positive".into()));
    }
    Ok(())
  }

  /// Apply the edit to `book`, shifting `available_copies` by the same delta
  /// as `total_copies`.
  pub fn apply(&self, book: &mut Book) -> Result<()> {
    if let Some(total) = self.total_copies {
      let on_loan = book.on_loan();
      if total < on_loan {
        return Err(Error::CopiesInCirculation(book.book_id.clone()));
      }
      book.available_copies = total - on_loan;
      book.total_copies = total;
    }
    if let Some(title) = &self.title {
      book.title = title.trim().to_owned();
    }
    if let Some(author) = &self.author {
      book.author = author.trim().to_owned();
    }
    if let Some(price) = self.price {
      book.price = price.round_dp(2);
    }
    Ok(())
  }
}

fn require_text(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::InvalidInput(format!("{field} must not be empty")));
  }
  Ok(())
}

fn validate_price(price: Decimal) -> Result<()> {
  if price.is_sign_negative() && !price.is_zero() {
    return Err(Error::InvalidInput("price must not be negative".into()));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn book(total: u32, available: u32) -> Book {
    Book {
      book_id:          "B1".into(),
      title:            "Dune".into(),
      author:           "Frank Herbert".into(),
      price:            Decimal::new(49950, 2),
      total_copies:     total,
      available_copies: available,
      added_at:         Utc::now(),
    }
  }

  #[test]
  fn new_book_requires_copies_and_fields() {
    let mut input = NewBook {
      book_id:      "B1".into(),
      title:        "Dune".into(),
      author:       "Frank Herbert".into(),
      price:        Decimal::from(300),
      total_copies: 0,
    };
    assert!(matches!(input.validate(), Err(Error::InvalidInput(_))));

    input.total_copies = 2;
    assert!(input.validate().is_ok());

    input.title = "   ".into();
    assert!(matches!(input.validate(), Err(Error::InvalidInput(_))));
  }

  #[test]
  fn negative_price_is_rejected() {
    let input = NewBook {
      book_id:      "B1".into(),
      title:        "Dune".into(),
      author:       "Frank Herbert".into(),
      price:        Decimal::from(-1),
      total_copies: 1,
    };
    assert!(matches!(input.validate(), Err(Error::InvalidInput(_))));
  }

  #[test]
  fn edit_cannot_zero_the_total() {
    let update = BookUpdate { total_copies: Some(0), ..Default::default() };
    assert!(matches!(update.validate(), Err(Error::InvalidInput(_))));
    assert!(
      BookUpdate { total_copies: Some(1), ..Default::default() }
        .validate()
        .is_ok()
    );
  }

  #[test]
  fn raising_total_raises_available() {
    let mut b = book(3, 1);
    BookUpdate { total_copies: Some(5), ..Default::default() }
      .apply(&mut b)
      .unwrap();
    assert_eq!((b.total_copies, b.available_copies), (5, 3));
  }

  #[test]
  fn total_cannot_drop_below_copies_on_loan() {
    let mut b = book(3, 1);
    let err = BookUpdate { total_copies: Some(1), ..Default::default() }
      .apply(&mut b)
      .unwrap_err();
    assert!(matches!(err, Error::CopiesInCirculation(_)));
    assert_eq!((b.total_copies, b.available_copies), (3, 1));

    BookUpdate { total_copies: Some(2), ..Default::default() }
      .apply(&mut b)
      .unwrap();
    assert_eq!((b.total_copies, b.available_copies), (2, 0));
  }
}
