//! Exact money column.
//!
//! SQLite has no decimal type and sea-orm reads `Decimal` back through `f64`,
//! so amounts are stored as their canonical text form instead.

use std::{fmt, str::FromStr};

use rust_decimal::Decimal;
use sea_orm::{
  ColIdx, DbErr, QueryResult, TryGetError, TryGetable, Value,
  sea_query::{ArrayType, ColumnType, Nullable, ValueType, ValueTypeErr},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(pub Decimal);

impl Money {
  pub const ZERO: Money = Money(Decimal::ZERO);
}

impl From<Decimal> for Money {
  fn from(value: Decimal) -> Self {
    Money(value)
  }
}

impl From<Money> for Decimal {
  fn from(value: Money) -> Self {
    value.0
  }
}

impl PartialEq<Decimal> for Money {
  fn eq(&self, other: &Decimal) -> bool {
    self.0 == *other
  }
}

impl fmt::Display for Money {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

impl FromStr for Money {
  type Err = rust_decimal::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Decimal::from_str_exact(s.trim()).map(Money)
  }
}

impl From<Money> for Value {
  fn from(money: Money) -> Self {
    Value::String(Some(Box::new(money.0.to_string())))
  }
}

impl TryGetable for Money {
  fn try_get_by<I: ColIdx>(res: &QueryResult, idx: I) -> Result<Self, TryGetError> {
    let raw = String::try_get_by(res, idx)?;
    raw.parse().map_err(|err| {
      TryGetError::DbErr(DbErr::Type(format!("invalid money value '{raw}': {err}")))
    })
  }
}

impl ValueType for Money {
  fn try_from(v: Value) -> Result<Self, ValueTypeErr> {
    let raw = <String as ValueType>::try_from(v)?;
    raw.parse().map_err(|_| ValueTypeErr)
  }

  fn type_name() -> String {
    "Money".to_owned()
  }

  fn array_type() -> ArrayType {
    ArrayType::String
  }

  fn column_type() -> ColumnType {
    ColumnType::Text
  }
}

impl Nullable for Money {
  fn null() -> Value {
    Value::String(None)
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;

  #[test]
  fn test_text_form_is_exact() {
    let money = Money(dec!(99999999999999999.99));
    let Value::String(Some(raw)) = Value::from(money) else {
      panic!("money must bind as text");
    };
    assert_eq!(*raw, "99999999999999999.99");
    assert_eq!(raw.parse::<Money>().unwrap(), money);
    assert_eq!(<Money as ValueType>::try_from(Value::from(money)).unwrap(), money);
  }

  #[test]
  fn test_rejects_garbage() {
    assert!("12.5.1".parse::<Money>().is_err());
    assert!(<Money as ValueType>::try_from(Value::Int(Some(1))).is_err());
  }
}
