use crate::types::Product;

/// Products visible in the grid for a given category and search term.
#[derive(Debug, PartialEq)]
pub enum VisibleProducts<'a> {
    /// No category chosen yet.
    NoCategory,
    /// A category is chosen but nothing survives the filters.
    NoMatches,
    Products(Vec<&'a Product>),
}

impl<'a> VisibleProducts<'a> {
    pub fn is_placeholder(&self) -> bool {
        !matches!(self, VisibleProducts::Products(_))
    }

    pub fn products(&self) -> &[&'a Product] {
        match self {
            VisibleProducts::Products(products) => products,
            _ => &[],
        }
    }
}

pub fn filter_products<'a>(
    products: &'a [Product],
    category: &str,
    search_term: &str,
) -> VisibleProducts<'a> {
    if category.is_empty() {
        return VisibleProducts::NoCategory;
    }

    let term = search_term.trim().to_lowercase();
    let visible: Vec<&Product> = products
        .iter()
        .filter(|product| product.category == category)
        .filter(|product| term.is_empty() || matches_term(product, &term))
        .collect();

    if visible.is_empty() {
        VisibleProducts::NoMatches
    } else {
        VisibleProducts::Products(visible)
    }
}

/// `term` must already be lowercased.
fn matches_term(product: &Product, term: &str) -> bool {
    product.name.to_lowercase().contains(term)
        || product.brand.to_lowercase().contains(term)
        || product.description.to_lowercase().contains(term)
}
