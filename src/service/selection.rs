//! Country filtering and ordering for number requests.

use crate::types::{DialCode, PriceInfo, ProviderCountry};
use crate::utils::dial_code::country_name_to_dial_code;
use std::collections::HashMap;

/// A country that passed the price and stock filter.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryOffer {
    pub id: u32,
    pub name: String,
    pub cost: f64,
    pub count: i64,
}

impl CountryOffer {
    /// Calling code resolved from the English country name.
    pub fn dial_code(&self) -> Option<DialCode> {
        country_name_to_dial_code(&self.name)
    }

    /// Calling code as a plain prefix, empty when the name is unknown.
    pub fn prefix(&self) -> String {
        self.dial_code()
            .map(|code| code.to_string())
            .unwrap_or_default()
    }
}

/// Keep countries that have a name, a price entry, stock, and a price inside
/// `[min_price, max_price]`; cheapest first.
///
/// The sort is stable, so equally priced countries keep the order of
/// `countries`.
pub fn select_countries(
    countries: &[ProviderCountry],
    prices: &HashMap<u32, PriceInfo>,
    min_price: f64,
    max_price: f64,
) -> Vec<CountryOffer> {
    let mut offers: Vec<CountryOffer> = countries
        .iter()
        .filter_map(|country| {
            let name = country.name.as_deref()?;
            let price = prices.get(&country.id)?;

            let qualifies =
                price.count > 0 && price.cost >= min_price && price.cost <= max_price;
            qualifies.then(|| CountryOffer {
                id: country.id,
                name: name.to_string(),
                cost: price.cost,
                count: price.count,
            })
        })
        .collect();

    offers.sort_by(|a, b| a.cost.total_cmp(&b.cost));
    offers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country(id: u32, name: Option<&str>) -> ProviderCountry {
        ProviderCountry {
            id,
            name: name.map(str::to_string),
        }
    }

    fn price(cost: f64, count: i64) -> PriceInfo {
        PriceInfo { cost, count }
    }

    #[test]
    fn test_filters_and_sorts_by_price() {
        let countries = vec![
            country(0, Some("Russia")),
            country(6, Some("Indonesia")),
            country(12, Some("USA")),
            country(16, Some("United Kingdom")),
            country(22, None),
            country(33, Some("Colombia")),
        ];
        let prices = HashMap::from([
            (0, price(30.0, 10)),
            (6, price(12.5, 40)),
            (12, price(150.0, 5)),
            (16, price(1.5, 100)),
            (22, price(3.0, 1)),
            // 33 is missing from the price list
        ]);

        let offers = select_countries(&countries, &prices, 2.0, 100.0);
        let ids: Vec<u32> = offers.iter().map(|o| o.id).collect();

        assert_eq!(ids, vec![6, 0]);
        assert_eq!(offers[0].name, "Indonesia");
    }

    #[test]
    fn test_skips_out_of_stock() {
        let countries = vec![country(1, Some("Ukraine")), country(2, Some("Kazakhstan"))];
        let prices = HashMap::from([(1, price(10.0, 0)), (2, price(10.0, 3))]);

        let offers = select_countries(&countries, &prices, 2.0, 100.0);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].id, 2);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let countries = vec![country(1, Some("Ukraine")), country(2, Some("Kazakhstan"))];
        let prices = HashMap::from([(1, price(2.0, 1)), (2, price(100.0, 1))]);

        assert_eq!(select_countries(&countries, &prices, 2.0, 100.0).len(), 2);
    }

    #[test]
    fn test_equal_prices_keep_input_order() {
        let countries = vec![
            country(5, Some("Ukraine")),
            country(3, Some("Kazakhstan")),
            country(9, Some("Vietnam")),
        ];
        let prices = HashMap::from([(5, price(8.0, 1)), (3, price(8.0, 1)), (9, price(4.0, 1))]);

        let ids: Vec<u32> = select_countries(&countries, &prices, 2.0, 100.0)
            .iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![9, 5, 3]);
    }

    #[test]
    fn test_offer_prefix() {
        let offer = CountryOffer {
            id: 6,
            name: "Indonesia".to_string(),
            cost: 12.0,
            count: 1,
        };
        assert_eq!(offer.prefix(), "62");

        let unknown = CountryOffer {
            name: "Atlantis".to_string(),
            ..offer
        };
        assert_eq!(unknown.prefix(), "");
    }
}
