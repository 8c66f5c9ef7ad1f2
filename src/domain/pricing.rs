use super::money::Money;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Weekly pass price per week when no override exists.
pub const WEEKLY_PASS_BASE: i64 = 6000;
pub const WEEKLY_PASS_MAX_WEEKS: u32 = 10;
/// Highest price an admin may set for a single SKU.
pub const MAX_PRICE: Money = Money(1_000_000_000);

/// SKUs covered by `/setprice normal`, in argument order.
pub const NORMAL_SKUS: [&str; 23] = [
    "11", "22", "33", "56", "86", "112", "172", "257", "343", "429", "514", "600", "706", "878",
    "963", "1049", "1135", "1412", "2195", "3688", "5532", "9288", "12976",
];

/// SKUs covered by `/setprice 2x`, in argument order.
pub const DOUBLE_SKUS: [&str; 4] = ["55", "165", "275", "565"];

const MLBB_DEFAULTS: [(&str, i64); 27] = [
    ("11", 950),
    ("22", 1900),
    ("33", 2850),
    ("56", 4200),
    ("112", 8200),
    ("86", 5100),
    ("172", 10200),
    ("257", 15300),
    ("343", 20400),
    ("429", 25500),
    ("514", 30600),
    ("600", 35700),
    ("706", 40800),
    ("878", 51000),
    ("963", 56100),
    ("1049", 61200),
    ("1135", 66300),
    ("1412", 81600),
    ("2195", 122400),
    ("3688", 204000),
    ("5532", 306000),
    ("9288", 510000),
    ("12976", 714000),
    ("55", 3500),
    ("165", 10000),
    ("275", 16000),
    ("565", 33000),
];

const PUBG_DEFAULTS: [(&str, i64); 6] = [
    ("60uc", 1500),
    ("325uc", 7500),
    ("660uc", 15000),
    ("1800uc", 37500),
    ("3850uc", 75000),
    ("8100uc", 150000),
];

/// Which game's price table a SKU belongs to.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum Catalog {
    Mlbb,
    Pubg,
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Catalog::Mlbb => "mlbb",
            Catalog::Pubg => "pubg",
        })
    }
}

/// Admin overrides for one catalog, keyed by SKU.
pub type PriceTable = BTreeMap<String, Money>;

/// Parses `wp<N>` with `N` in `1..=10`.
pub fn weekly_pass_weeks(sku: &str) -> Option<u32> {
    let weeks: u32 = sku.strip_prefix("wp")?.parse().ok()?;
    (1..=WEEKLY_PASS_MAX_WEEKS).contains(&weeks).then_some(weeks)
}

/// Resolves the price of `sku`: override, then built-in default, then the
/// weekly-pass formula. `None` means the SKU is not for sale.
pub fn resolve_price(catalog: Catalog, sku: &str, overrides: &PriceTable) -> Option<Money> {
    let price = overrides.get(sku).copied().or_else(|| match catalog {
        Catalog::Mlbb => MLBB_DEFAULTS
            .iter()
            .find(|(key, _)| *key == sku)
            .map(|(_, price)| Money::new(*price))
            .or_else(|| {
                weekly_pass_weeks(sku).map(|weeks| Money::new(i64::from(weeks) * WEEKLY_PASS_BASE))
            }),
        Catalog::Pubg => PUBG_DEFAULTS
            .iter()
            .find(|(key, _)| *key == sku)
            .map(|(_, price)| Money::new(*price)),
    })?;
    price.is_positive().then_some(price)
}

/// Every SKU on sale in `catalog` with its effective price, in default
/// table order followed by extra overrides.
pub fn price_list(catalog: Catalog, overrides: &PriceTable) -> Vec<(String, Money)> {
    let defaults: Vec<String> = match catalog {
        Catalog::Mlbb => MLBB_DEFAULTS
            .iter()
            .map(|(sku, _)| sku.to_string())
            .chain((1..=WEEKLY_PASS_MAX_WEEKS).map(|w| format!("wp{w}")))
            .collect(),
        Catalog::Pubg => PUBG_DEFAULTS.iter().map(|(sku, _)| sku.to_string()).collect(),
    };
    let extras: Vec<String> = overrides
        .keys()
        .filter(|k| !defaults.contains(k))
        .cloned()
        .collect();

    defaults
        .into_iter()
        .chain(extras)
        .filter_map(|sku| resolve_price(catalog, &sku, overrides).map(|price| (sku, price)))
        .collect()
}

/// Derives `wp1..wp10` from the full price of a `weeks`-week pass.
///
/// Each entry is `price / weeks * i` truncated to whole units, computed
/// without intermediate rounding. `None` if a product does not fit.
pub fn weekly_pass_prices(full_price: Money, weeks: u32) -> Option<Vec<(String, Money)>> {
    let weeks = i64::from(weeks.max(1));
    (1..=i64::from(WEEKLY_PASS_MAX_WEEKS))
        .map(|i| {
            let price = full_price.units().checked_mul(i)? / weeks;
            Some((format!("wp{i}"), Money::new(price)))
        })
        .collect()
}

/// Pairs a fixed SKU list with admin-supplied prices.
///
/// The batch is rejected whole if the count differs or any price is not an
/// integer in `0..=MAX_PRICE`; the error names the offending SKU.
pub fn batch_prices(skus: &[&str], raw: &[&str]) -> Result<Vec<(String, Money)>, BatchError> {
    if raw.len() != skus.len() {
        return Err(BatchError::Count {
            expected: skus.len(),
            got: raw.len(),
        });
    }
    skus.iter()
        .zip(raw)
        .map(|(sku, value)| match value.parse::<i64>() {
            Ok(price) if (0..=MAX_PRICE.units()).contains(&price) => {
                Ok((sku.to_string(), Money::new(price)))
            }
            _ => Err(BatchError::Price(sku.to_string())),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    Count { expected: usize, got: usize },
    Price(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_then_default_then_weekly_pass() {
        let mut overrides = PriceTable::new();
        overrides.insert("86".into(), Money::new(6000));

        assert_eq!(
            resolve_price(Catalog::Mlbb, "86", &overrides),
            Some(Money::new(6000))
        );
        assert_eq!(
            resolve_price(Catalog::Mlbb, "11", &overrides),
            Some(Money::new(950))
        );
        assert_eq!(
            resolve_price(Catalog::Mlbb, "wp3", &overrides),
            Some(Money::new(18000))
        );
        assert_eq!(resolve_price(Catalog::Mlbb, "wp11", &overrides), None);
        assert_eq!(resolve_price(Catalog::Mlbb, "999", &overrides), None);
        assert_eq!(resolve_price(Catalog::Pubg, "86", &overrides), None);
        assert_eq!(
            resolve_price(Catalog::Pubg, "60uc", &overrides),
            Some(Money::new(1500))
        );
    }

    #[test]
    fn test_zero_override_disables_sku() {
        let mut overrides = PriceTable::new();
        overrides.insert("11".into(), Money::ZERO);
        assert_eq!(resolve_price(Catalog::Mlbb, "11", &overrides), None);
    }

    #[test]
    fn test_weekly_pass_derivation() {
        let prices = weekly_pass_prices(Money::new(60000), 10).unwrap();
        let expected: Vec<i64> = (1..=10).map(|i| 6000 * i).collect();
        assert_eq!(
            prices.iter().map(|(_, p)| p.units()).collect::<Vec<_>>(),
            expected
        );
        assert_eq!(prices[0].0, "wp1");
        assert_eq!(prices[9].0, "wp10");
    }

    #[test]
    fn test_weekly_pass_derivation_truncates() {
        let prices = weekly_pass_prices(Money::new(20000), 3).unwrap();
        assert_eq!(prices[0].1, Money::new(6666));
        assert_eq!(prices[1].1, Money::new(13333));
        assert_eq!(prices[2].1, Money::new(20000));
    }

    #[test]
    fn test_weekly_pass_overflow_is_refused() {
        assert_eq!(weekly_pass_prices(Money::new(i64::MAX), 1), None);
        assert!(weekly_pass_prices(MAX_PRICE, 1).is_some());
    }

    #[test]
    fn test_batch_requires_exact_count() {
        let raw = ["1", "2", "3"];
        assert_eq!(
            batch_prices(&DOUBLE_SKUS, &raw),
            Err(BatchError::Count {
                expected: 4,
                got: 3
            })
        );
        let raw = ["1", "2", "x", "4"];
        assert_eq!(
            batch_prices(&DOUBLE_SKUS, &raw),
            Err(BatchError::Price("275".into()))
        );
        let raw = ["3600", "10500", "16500", "34000"];
        let batch = batch_prices(&DOUBLE_SKUS, &raw).unwrap();
        assert_eq!(batch[3], ("565".to_string(), Money::new(34000)));
    }

    #[test]
    fn test_price_list_includes_weekly_passes() {
        let list = price_list(Catalog::Mlbb, &PriceTable::new());
        assert_eq!(list.len(), 27 + 10);
        assert!(list.contains(&("wp10".to_string(), Money::new(60000))));
    }
}
