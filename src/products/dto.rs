use serde::{Deserialize, Serialize};

use super::repo::Product;
use crate::forum::repo::Topic;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: f64,
    pub quantity: i32,
    pub privacy: String,
}

#[derive(Debug, Deserialize)]
pub struct EditProductRequest {
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: f64,
    pub quantity: i32,
    pub privacy: String,
}

#[derive(Debug, Serialize)]
pub struct ProductsResponse {
    pub success: bool,
    pub products: Vec<Product>,
}

/// Shared by the single-product read and the create response; the
/// frontend expects the `product` key in both places.
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub success: bool,
    pub product: Product,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedProductResponse {
    pub success: bool,
    pub updated_product: Product,
}

#[derive(Debug, Serialize)]
pub struct DeletedProductResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateProductsResponse {
    pub success: bool,
    pub private_products: Vec<Product>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminTopicsResponse {
    pub success: bool,
    pub forum_topics: Vec<Topic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_responses_use_the_frontend_key_names() {
        let json = serde_json::to_string(&PrivateProductsResponse {
            success: true,
            private_products: vec![],
        })
        .unwrap();
        assert!(json.contains("\"privateProducts\""));

        let json = serde_json::to_string(&AdminTopicsResponse {
            success: true,
            forum_topics: vec![],
        })
        .unwrap();
        assert!(json.contains("\"forumTopics\""));
    }
}
