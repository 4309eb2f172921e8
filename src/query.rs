//! Catalog search: request parameters, the plan built from them, and its
//! execution against a [`ProductRepository`].
//!
//! Search results are never cached; every call runs the page query and the
//! count query against the store, concurrently.

use crate::error::{Error, Result};
use crate::models::Product;
use crate::repository::ProductRepository;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default number of products per search page.
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Raw search parameters as they arrive in the query string.
///
/// Every field is optional and empty strings count as absent.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub category: Option<String>,
    pub price: Option<String>,
    pub page: Option<String>,
}

/// Price ordering of a search page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
    /// Store order (oldest first).
    #[default]
    Unordered,
}

impl SortOrder {
    /// `asc` and `desc` select a price order; anything else is unordered.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("asc") => SortOrder::Ascending,
            Some("desc") => SortOrder::Descending,
            _ => SortOrder::Unordered,
        }
    }

    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            SortOrder::Ascending => a.price.total_cmp(&b.price),
            SortOrder::Descending => b.price.total_cmp(&a.price),
            SortOrder::Unordered => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
        }
    }
}

/// Conjunction of the present constraints.
#[derive(Clone, Debug, Default)]
pub struct ProductFilter {
    pub name: Option<Regex>,
    pub max_price: Option<f64>,
    pub category: Option<String>,
}

impl ProductFilter {
    /// Filter on a case-insensitive name pattern.
    ///
    /// A pattern that does not compile is matched as a literal substring.
    pub fn name_pattern(pattern: &str) -> Result<Regex> {
        let built = RegexBuilder::new(pattern).case_insensitive(true).build();
        match built {
            Ok(regex) => Ok(regex),
            Err(e) => {
                debug!("Search pattern {:?} is not a regex ({}), matching literally", pattern, e);
                RegexBuilder::new(&regex::escape(pattern))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::validation(format!("Invalid search: {}", e)))
            }
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        if let Some(name) = &self.name {
            if !name.is_match(&product.name) {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if product.price > max {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        true
    }
}

/// Everything a store needs to answer one search page.
#[derive(Clone, Debug)]
pub struct SearchPlan {
    pub filter: ProductFilter,
    pub sort: SortOrder,
    /// 1-based.
    pub page: usize,
    pub skip: usize,
    pub limit: usize,
}

impl SearchPlan {
    /// Number of pages needed for `count` matches.
    pub fn total_pages(&self, count: u64) -> u64 {
        count.div_ceil(self.limit as u64)
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl SearchQuery {
    /// Build the plan for this request with `page_size` products per page.
    ///
    /// A missing, non-numeric or non-positive page is page 1.
    ///
    /// # Errors
    ///
    /// `Error::ValidationError` when `price` is present but not a number.
    pub fn plan(&self, page_size: usize) -> Result<SearchPlan> {
        let limit = if page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            page_size
        };

        let name = present(&self.search)
            .map(ProductFilter::name_pattern)
            .transpose()?;

        let max_price = present(&self.price)
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|p| p.is_finite())
                    .ok_or_else(|| Error::validation("Invalid price"))
            })
            .transpose()?;

        let category = present(&self.category).map(str::to_string);

        let page = present(&self.page)
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|p| *p > 0)
            .map(|p| p as usize)
            .unwrap_or(1);

        Ok(SearchPlan {
            filter: ProductFilter {
                name,
                max_price,
                category,
            },
            sort: SortOrder::parse(present(&self.sort)),
            page,
            skip: (page - 1).saturating_mul(limit),
            limit,
        })
    }
}

/// One page of search results.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub products: Vec<Product>,
    pub total_page: u64,
    #[serde(skip)]
    pub count: u64,
}

/// Run the page query and the count query concurrently.
///
/// # Errors
///
/// Returns the first store error.
pub async fn execute<P: ProductRepository>(repo: &P, plan: &SearchPlan) -> Result<SearchPage> {
    let (products, count) = tokio::try_join!(repo.search(plan), repo.count_matching(&plan.filter))?;

    debug!(
        "Search page {} returned {} of {} matches",
        plan.page,
        products.len(),
        count
    );

    Ok(SearchPage {
        products,
        total_page: plan.total_pages(count),
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewProduct;

    fn product(name: &str, price: f64, category: &str) -> Product {
        Product::new(
            NewProduct {
                name: name.to_string(),
                price,
                stock: 1,
                category: category.to_string(),
            },
            vec![],
        )
    }

    fn query(pairs: &[(&str, &str)]) -> SearchQuery {
        let mut q = SearchQuery::default();
        for (k, v) in pairs {
            let v = Some(v.to_string());
            match *k {
                "search" => q.search = v,
                "sort" => q.sort = v,
                "category" => q.category = v,
                "price" => q.price = v,
                "page" => q.page = v,
                _ => unreachable!(),
            }
        }
        q
    }

    #[test]
    fn test_page_defaults_to_one() {
        for raw in ["0", "-3", "abc", ""] {
            let plan = query(&[("page", raw)]).plan(8).unwrap();
            assert_eq!(plan.page, 1, "page {:?}", raw);
            assert_eq!(plan.skip, 0);
        }

        let plan = SearchQuery::default().plan(8).unwrap();
        assert_eq!((plan.page, plan.skip, plan.limit), (1, 0, 8));
    }

    #[test]
    fn test_skip_from_page() {
        let plan = query(&[("page", "3")]).plan(8).unwrap();
        assert_eq!(plan.skip, 16);
        assert_eq!(plan.limit, 8);
    }

    #[test]
    fn test_zero_page_size_uses_default() {
        let plan = SearchQuery::default().plan(0).unwrap();
        assert_eq!(plan.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_total_pages() {
        let plan = SearchQuery::default().plan(8).unwrap();
        assert_eq!(plan.total_pages(17), 3);
        assert_eq!(plan.total_pages(16), 2);
        assert_eq!(plan.total_pages(0), 0);
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!(SortOrder::parse(Some("asc")), SortOrder::Ascending);
        assert_eq!(SortOrder::parse(Some("desc")), SortOrder::Descending);
        assert_eq!(SortOrder::parse(Some("price")), SortOrder::Unordered);
        assert_eq!(SortOrder::parse(None), SortOrder::Unordered);
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let plan = query(&[("search", "LAPTOP")]).plan(8).unwrap();
        assert!(plan.filter.matches(&product("Gaming laptop", 900.0, "computers")));
        assert!(!plan.filter.matches(&product("Mouse", 20.0, "computers")));
    }

    #[test]
    fn test_invalid_pattern_matches_literally() {
        let plan = query(&[("search", "c++ (")]).plan(8).unwrap();
        assert!(plan.filter.matches(&product("Learn C++ (2nd ed)", 40.0, "books")));
        assert!(!plan.filter.matches(&product("Learn Rust", 40.0, "books")));
    }

    #[test]
    fn test_price_is_a_ceiling() {
        let plan = query(&[("price", "500")]).plan(8).unwrap();
        assert!(plan.filter.matches(&product("Phone", 500.0, "phones")));
        assert!(!plan.filter.matches(&product("Phone Pro", 500.01, "phones")));
    }

    #[test]
    fn test_invalid_price_is_rejected() {
        let err = query(&[("price", "cheap")]).plan(8).unwrap_err();
        assert!(matches!(err, Error::ValidationError(_)));
    }

    #[test]
    fn test_constraints_and_together() {
        let plan = query(&[("search", "pro"), ("category", "phones")])
            .plan(8)
            .unwrap();

        assert!(plan.filter.matches(&product("Phone Pro", 999.0, "phones")));
        assert!(!plan.filter.matches(&product("Phone", 499.0, "phones")));
        assert!(!plan.filter.matches(&product("MacBook Pro", 1999.0, "laptops")));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let plan = query(&[("search", ""), ("category", "  "), ("price", "")])
            .plan(8)
            .unwrap();
        assert!(plan.filter.name.is_none());
        assert!(plan.filter.category.is_none());
        assert!(plan.filter.max_price.is_none());
    }
}
