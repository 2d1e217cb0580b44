//! Domain entities: the inventory record

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::avl::Keyed;
use crate::domain::error::{DomainError, DomainResult};

/// Unique product identifier; the ordering key of the inventory tree.
pub type ProductId = i64;

/// A stocked product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unit price in cents
    pub price_cents: u64,
    pub quantity: u32,
}

impl Product {
    pub fn new(id: ProductId, name: impl Into<String>, price_cents: u64, quantity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price_cents,
            quantity,
        }
    }

    /// Build a product from user-supplied text fields.
    pub fn parse(id: ProductId, name: &str, price: &str, quantity: u32) -> DomainResult<Self> {
        let product = Self::new(id, name.trim(), parse_price(price)?, quantity);
        product.validate()?;
        Ok(product)
    }

    /// Check the fields the tree does not care about.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::InvalidProduct {
                message: format!("product {} has an empty name", self.id),
            });
        }
        Ok(())
    }

    /// Stock value of this product in cents (price × quantity).
    pub fn value_cents(&self) -> u128 {
        u128::from(self.price_cents) * u128::from(self.quantity)
    }
}

impl Keyed for Product {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.id
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.id,
            self.name,
            format_price(u128::from(self.price_cents)),
            self.quantity
        )
    }
}

/// Parse a decimal price into cents.
///
/// Accepts `12`, `12.5`, `12.50`, `.50` and the comma form `12,50`.
/// At most two fractional digits are allowed.
pub fn parse_price(input: &str) -> DomainResult<u64> {
    let invalid = |reason: &str| DomainError::InvalidPrice {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let normalized = input.trim().replace(',', ".");
    let (units, fraction) = match normalized.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (normalized.as_str(), ""),
    };

    if units.is_empty() && fraction.is_empty() {
        return Err(invalid("expected digits"));
    }
    if !units.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected digits before the decimal separator"));
    }
    if fraction.len() > 2 || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected at most two decimal digits"));
    }

    // `.50` means `0.50`
    let units: u64 = match units {
        "" => 0,
        digits => digits.parse().map_err(|_| invalid("value too large"))?,
    };
    let cents = match fraction.len() {
        0 => 0,
        1 => u64::from(fraction.as_bytes()[0] - b'0') * 10,
        _ => fraction.parse::<u64>().map_err(|_| invalid("invalid decimals"))?,
    };

    units
        .checked_mul(100)
        .and_then(|c| c.checked_add(cents))
        .ok_or_else(|| invalid("value too large"))
}

/// Render cents as `units.cc`.
pub fn format_price(cents: u128) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}
