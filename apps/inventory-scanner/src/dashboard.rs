//! Product list, categories and statistics shown next to the scanner

use domain_products::{InventoryStats, Product, ProductFilter};
use std::fmt;

use crate::client::{ClientResult, InventoryClient};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dashboard {
    pub products: Vec<Product>,
    pub categories: Vec<String>,
    pub stats: InventoryStats,
}

impl Dashboard {
    /// Reload all three views. On failure the previous contents are kept.
    pub async fn refresh(
        &mut self,
        client: &InventoryClient,
        low_stock_only: bool,
    ) -> ClientResult<()> {
        let filter = ProductFilter {
            category: None,
            low_stock: low_stock_only.then(|| "true".to_string()),
        };

        let (products, categories, stats) = tokio::try_join!(
            client.list_products(&filter),
            client.categories(),
            client.stats(),
        )?;

        self.products = products;
        self.categories = categories;
        self.stats = stats;
        Ok(())
    }
}

/// One product per line, flagging low stock.
pub struct ProductList<'a>(pub &'a [Product]);

impl fmt::Display for ProductList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(f, "No products found");
        }

        for p in self.0 {
            write!(
                f,
                "{:<16} {:<28} {:<16} {:>10.2}  stock {:>5}",
                p.barcode, p.name, p.category, p.cost, p.stock
            )?;
            if p.is_low_stock() {
                write!(f, "  LOW (min {})", p.min_stock)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Detail view of a single product.
pub struct ProductDetails<'a>(pub &'a Product);

impl fmt::Display for ProductDetails<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.0;
        writeln!(f, "Barcode         {}", p.barcode)?;
        writeln!(f, "Name            {}", p.name)?;
        writeln!(f, "Category        {}", p.category)?;
        writeln!(f, "Cost            {:.2}", p.cost)?;
        writeln!(f, "Stock           {}", p.stock)?;
        writeln!(f, "Min Stock Alert {}", p.min_stock)?;
        if let Some(at) = p.last_scanned {
            writeln!(f, "Last scanned    {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        Ok(())
    }
}

pub struct StatsSummary<'a>(pub &'a InventoryStats);

impl fmt::Display for StatsSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.0;
        writeln!(f, "Products    {}", s.total_products)?;
        writeln!(f, "Total value {:.2}", s.total_value)?;
        writeln!(f, "Low stock   {}", s.low_stock_count)?;
        writeln!(f, "Categories  {}", s.categories_count)
    }
}
