//! Aggregation helpers behind the admin dashboard.

use crate::error::Result;
use crate::models::{Order, Product, User};
use crate::repository::{ProductRepository, Record};
use chrono::{DateTime, Datelike, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

/// Month-over-month change, as a percentage of last month.
///
/// With nothing last month the change is `this_month * 100`.
pub fn calculate_percentage(this_month: f64, last_month: f64) -> f64 {
    if last_month == 0.0 {
        return this_month * 100.0;
    }
    (this_month / last_month * 100.0).round()
}

/// Share of the catalog held by one category, in whole percent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategoryShare {
    pub category: String,
    pub percentage: f64,
}

/// Percentage of `products_count` in each category.
///
/// One count per category, all issued concurrently. An empty catalog gives
/// every category 0.
///
/// # Errors
///
/// Returns the first store error.
pub async fn get_inventories<P: ProductRepository>(
    repo: &P,
    categories: &[String],
    products_count: u64,
) -> Result<Vec<CategoryShare>> {
    let lookups: Vec<_> = categories
        .iter()
        .map(|c| repo.count_in_category(c))
        .collect();
    let counts = try_join_all(lookups).await?;

    Ok(categories
        .iter()
        .zip(counts)
        .map(|(category, count)| CategoryShare {
            category: category.clone(),
            percentage: if products_count == 0 {
                0.0
            } else {
                (count as f64 / products_count as f64 * 100.0).round()
            },
        })
        .collect())
}

/// Numeric field summed into chart buckets instead of counting documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartProperty {
    Discount,
    Total,
}

/// A record that can be bucketed by creation month.
pub trait ChartDocument: Record {
    /// Value of `property`; documents without it contribute 0.
    fn value_of(&self, _property: ChartProperty) -> f64 {
        0.0
    }
}

impl ChartDocument for Order {
    fn value_of(&self, property: ChartProperty) -> f64 {
        match property {
            ChartProperty::Discount => self.discount,
            ChartProperty::Total => self.total,
        }
    }
}

impl ChartDocument for Product {}

impl ChartDocument for User {}

/// Bucket documents into the `length` months ending with `today`'s month.
///
/// Index `length - 1` is the current month. Only the calendar month is
/// compared, so callers pass documents from the last twelve months.
/// Without a property each document counts 1.
pub fn get_chart_data<D: ChartDocument>(
    length: usize,
    docs: &[D],
    today: DateTime<Utc>,
    property: Option<ChartProperty>,
) -> Vec<f64> {
    let mut data = vec![0.0; length];
    let this_month = today.month0() as usize;

    for doc in docs {
        let month = doc.created_at().month0() as usize;
        let offset = (this_month + 12 - month) % 12;

        if offset < length {
            data[length - offset - 1] += match property {
                Some(p) => doc.value_of(p),
                None => 1.0,
            };
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[derive(Clone)]
    struct Doc {
        at: DateTime<Utc>,
        total: f64,
    }

    impl Record for Doc {
        type Id = i64;

        fn record_id(&self) -> i64 {
            self.at.timestamp()
        }

        fn created_at(&self) -> DateTime<Utc> {
            self.at
        }
    }

    impl ChartDocument for Doc {
        fn value_of(&self, property: ChartProperty) -> f64 {
            match property {
                ChartProperty::Total => self.total,
                ChartProperty::Discount => 0.0,
            }
        }
    }

    fn at(year: i32, month: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_percentage() {
        assert_eq!(calculate_percentage(5.0, 0.0), 500.0);
        assert_eq!(calculate_percentage(50.0, 100.0), 50.0);
        assert_eq!(calculate_percentage(1.0, 3.0), 33.0);
        assert_eq!(calculate_percentage(2.0, 3.0), 67.0);
        assert_eq!(calculate_percentage(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_chart_buckets() {
        let today = at(2024, 6);
        let docs = vec![
            Doc { at: at(2024, 6), total: 10.0 },
            Doc { at: at(2024, 6), total: 5.0 },
            Doc { at: at(2024, 4), total: 7.0 },
            Doc { at: at(2023, 12), total: 99.0 },
        ];

        assert_eq!(
            get_chart_data(6, &docs, today, None),
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 2.0]
        );
        assert_eq!(
            get_chart_data(6, &docs, today, Some(ChartProperty::Total)),
            vec![0.0, 0.0, 0.0, 7.0, 0.0, 15.0]
        );
    }

    #[test]
    fn test_chart_wraps_year_boundary() {
        let today = at(2024, 2);
        let docs = vec![Doc { at: at(2023, 11), total: 1.0 }];

        // Feb - Nov = 3 months back
        assert_eq!(
            get_chart_data(6, &docs, today, None),
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[tokio::test]
    async fn test_inventories() {
        use crate::models::NewProduct;
        use crate::repository::MemoryTable;

        let table = MemoryTable::<Product>::new();
        for category in ["shoes", "shoes", "shoes", "hats"] {
            table.insert(Product::new(
                NewProduct {
                    name: format!("{} item", category),
                    price: 10.0,
                    stock: 1,
                    category: category.to_string(),
                },
                vec![],
            ));
        }
        let categories = vec!["shoes".to_string(), "hats".to_string(), "bags".to_string()];

        let shares = get_inventories(&table, &categories, 4).await.unwrap();
        let percentages: Vec<f64> = shares.iter().map(|s| s.percentage).collect();
        assert_eq!(percentages, vec![75.0, 25.0, 0.0]);
        assert_eq!(shares[0].category, "shoes");

        let empty = get_inventories(&table, &categories, 0).await.unwrap();
        assert!(empty.iter().all(|s| s.percentage == 0.0));
    }

    #[test]
    fn test_zero_length_chart() {
        let docs = vec![Doc { at: at(2024, 1), total: 1.0 }];
        assert!(get_chart_data(0, &docs, at(2024, 1), None).is_empty());
    }
}
