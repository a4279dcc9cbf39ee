//! services/api/src/adapters/barcode.rs
//!
//! Barcode lookups against the Open Food Facts product API.
//! It implements the `BarcodeLookupService` port from the `core` crate.

use async_trait::async_trait;
use carbon_lens_core::domain::{AnalyzedObject, Category, Symbology};
use carbon_lens_core::ports::{BarcodeLookupService, PortError, PortResult};
use reqwest::Client;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const FIELDS: &str = "product_name,brands,categories_tags,product_quantity,ecoscore_data";

#[derive(Debug, Deserialize)]
pub struct ProductResponse {
    #[serde(default)]
    pub status: i64,
    pub product: Option<Product>,
}

#[derive(Debug, Deserialize)]
pub struct Product {
    pub product_name: Option<String>,
    pub brands: Option<String>,
    #[serde(default)]
    pub categories_tags: Vec<String>,
    /// Net quantity in grams or millilitres; sent as a string or a number.
    pub product_quantity: Option<serde_json::Value>,
    pub ecoscore_data: Option<EcoscoreData>,
}

#[derive(Debug, Deserialize)]
pub struct EcoscoreData {
    pub agribalyse: Option<Agribalyse>,
}

#[derive(Debug, Deserialize)]
pub struct Agribalyse {
    /// kg CO2e per kg of product.
    pub co2_total: Option<f64>,
}

fn quantity_grams(value: &serde_json::Value) -> Option<f64> {
    let grams: Option<f64> = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    grams.filter(|q| q.is_finite() && *q > 0.0)
}

fn category_for(tags: &[String]) -> Category {
    if tags.iter().any(|t| t.ends_with(":beverages") || t.ends_with(":drinks")) {
        Category::Beverage
    } else if tags.is_empty() {
        Category::Product
    } else {
        Category::Food
    }
}

/// Converts a product response into analyzed objects (zero or one).
pub fn product_to_objects(code: &str, response: ProductResponse) -> Vec<AnalyzedObject> {
    let Some(product) = response.product.filter(|_| response.status == 1) else {
        return Vec::new();
    };

    let per_kg = product
        .ecoscore_data
        .and_then(|e| e.agribalyse)
        .and_then(|a| a.co2_total)
        .filter(|v| v.is_finite());
    let grams = product.product_quantity.as_ref().and_then(quantity_grams);
    // Per-unit footprint when the pack size is known, otherwise per kilogram.
    let carbon = match (per_kg, grams) {
        (Some(per_kg), Some(grams)) => per_kg * grams / 1000.0,
        (Some(per_kg), None) => per_kg,
        (None, _) => 0.0,
    };

    let name = product
        .product_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("Product {}", code));

    let mut object = AnalyzedObject::new(
        name,
        category_for(&product.categories_tags),
        Decimal::from_f64(carbon).unwrap_or_default().round_dp(3),
    )
    .with_metadata("barcode", json!(code));
    if let Some(brands) = product.brands.filter(|b| !b.is_empty()) {
        object = object.with_metadata("brands", json!(brands));
    }
    if per_kg.is_none() {
        object = object.with_metadata("carbon_estimate", json!("unavailable"));
    }
    vec![object]
}

/// An adapter that implements `BarcodeLookupService` over HTTP.
#[derive(Clone)]
pub struct OpenFoodFactsAdapter {
    client: Client,
    base_url: String,
}

impl OpenFoodFactsAdapter {
    pub fn new(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BarcodeLookupService for OpenFoodFactsAdapter {
    async fn lookup(&self, code: &str, symbology: Symbology) -> PortResult<Vec<AnalyzedObject>> {
        if symbology == Symbology::Qr {
            debug!("QR codes are not product barcodes; skipping lookup.");
            return Ok(Vec::new());
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PortError::NotFound(format!("'{}' is not a product code", code)));
        }

        let url = format!("{}/{}.json", self.base_url, code);
        let response = self
            .client
            .get(&url)
            .query(&[("fields", FIELDS)])
            .send()
            .await
            .map_err(|e| PortError::Unavailable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let response = response
            .error_for_status()
            .map_err(|e| PortError::Unavailable(e.to_string()))?;
        let body: ProductResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed product response: {}", e)))?;

        Ok(product_to_objects(code, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ProductResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn per_unit_carbon_from_pack_size() {
        let response = parse(
            r#"{"status": 1, "product": {
                "product_name": "Oat Drink", "brands": "Oatly",
                "categories_tags": ["en:plant-based-foods", "en:beverages"],
                "product_quantity": "1000",
                "ecoscore_data": {"agribalyse": {"co2_total": 0.42}}
            }}"#,
        );
        let objects = product_to_objects("7394376616228", response);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].name, "Oat Drink");
        assert_eq!(objects[0].category, Category::Beverage);
        assert_eq!(objects[0].carbon_kg, Decimal::new(42, 2));
        assert_eq!(objects[0].metadata["brands"], json!("Oatly"));
    }

    #[test]
    fn half_kilo_pack() {
        let response = parse(
            r#"{"status": 1, "product": {"product_name": "Pasta", "categories_tags": ["en:pastas"],
                "product_quantity": 500, "ecoscore_data": {"agribalyse": {"co2_total": 1.5}}}}"#,
        );
        let objects = product_to_objects("1", response);
        assert_eq!(objects[0].category, Category::Food);
        assert_eq!(objects[0].carbon_kg, Decimal::new(75, 2));
    }

    #[test]
    fn unknown_product_is_empty() {
        let response = parse(r#"{"status": 0, "status_verbose": "product not found"}"#);
        assert!(product_to_objects("000", response).is_empty());
    }

    #[test]
    fn missing_footprint_is_zero_and_flagged() {
        let response = parse(r#"{"status": 1, "product": {}}"#);
        let objects = product_to_objects("123", response);
        assert_eq!(objects[0].name, "Product 123");
        assert_eq!(objects[0].category, Category::Product);
        assert_eq!(objects[0].carbon_kg, Decimal::ZERO);
        assert_eq!(objects[0].metadata["carbon_estimate"], json!("unavailable"));
    }
}
