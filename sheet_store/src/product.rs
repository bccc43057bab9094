use std::time::{SystemTime, UNIX_EPOCH};

use catalog_common::Peso;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The canonical storefront categories, in display order.
pub const CATEGORIES: [&str; 5] = [
    "Cerámicas de Piso",
    "Cerámicas de Muro",
    "Porcelanatos",
    "Pisos Flotantes",
    "Pisos Vinílicos SPC",
];

/// A catalog entry. `cost` and `provider` are private fields that never appear in public output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub format: String,
    /// Square meters covered per box.
    pub yield_m2: f64,
    /// Public sale price per square meter.
    pub price: Peso,
    pub finish: String,
    pub code: String,
    pub description: String,
    /// Ordered image URLs; order defines display order.
    pub images: Vec<String>,
    /// Acquisition cost. Not shown in public views.
    pub cost: Peso,
    pub provider: String,
    /// Opaque timestamp assigned by the sheet script at creation. Preserved verbatim.
    pub created_at: Value,
    pub is_featured: bool,
}

impl Product {
    /// Decodes a raw sheet row into a `Product`, coercing every field to its declared type.
    ///
    /// The script returns lowercase keys, but rows written by older script versions can still
    /// carry camelCase, so both spellings are accepted. Unparseable numbers become 0, missing
    /// strings become empty, and the featured flag goes through the multi-encoding truth table
    /// in [`featured_flag`].
    pub fn from_row(row: &Value) -> Self {
        let raw_featured = if row["isfeatured"].is_null() { &row["isFeatured"] } else { &row["isfeatured"] };
        let created_at = if row["createdat"].is_null() { row["createdAt"].clone() } else { row["createdat"].clone() };
        Self {
            id: string_or_default(&row["id"]).trim().to_string(),
            name: string_or_default(&row["name"]),
            category: string_or_default(&row["category"]),
            format: string_or_default(&row["format"]),
            yield_m2: number_or_zero(&row["yield"]),
            price: Peso::from(number_or_zero(&row["price"]) as i64),
            finish: string_or_default(&row["finish"]),
            code: string_or_default(&row["code"]),
            description: string_or_default(&row["description"]),
            images: images_from_value(&row["images"]),
            cost: Peso::from(number_or_zero(&row["cost"]) as i64),
            provider: string_or_default(&row["provider"]),
            created_at,
            is_featured: featured_flag(raw_featured),
        }
    }

    /// Serializes the product into the shape the sheet script expects for `create` and `update`
    /// payloads: images comma-joined, the featured flag as the literal `"TRUE"` / `"FALSE"`.
    pub fn to_row(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "category": self.category,
            "format": self.format,
            "yield": self.yield_m2,
            "price": self.price.value(),
            "finish": self.finish,
            "code": self.code,
            "description": self.description,
            "images": self.images.join(","),
            "cost": self.cost.value(),
            "provider": self.provider,
            "createdAt": self.created_at,
            "isFeatured": if self.is_featured { "TRUE" } else { "FALSE" },
        })
    }
}

/// Generates a fresh product id: the millisecond timestamp in base 36 plus a random
/// alphanumeric suffix. Unique enough for a single shared sheet.
pub fn new_product_id() -> String {
    let millis = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or_default();
    let mut id = to_base36(millis);
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    for _ in 0..11 {
        id.push(CHARSET[rng.gen_range(0..CHARSET.len())] as char);
    }
    id
}

fn to_base36(mut n: u128) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut buf = Vec::new();
    while n > 0 {
        buf.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    buf.reverse();
    String::from_utf8(buf).unwrap_or_default()
}

fn string_or_default(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn number_or_zero(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// The sheet stores the featured flag in whatever shape the editing client felt like writing.
/// `true`, `1`, `"TRUE"`, `"VERDADERO"` and `"SI"` (any casing, padded or not) all mean
/// featured; everything else does not.
pub fn featured_flag(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        // Sheets emit both integer 1 and float 1.0 for checkbox-style columns.
        Value::Number(n) => n.as_f64() == Some(1.0),
        Value::String(s) => {
            let clean = s.trim().to_uppercase();
            clean == "TRUE" || clean == "VERDADERO" || clean == "SI"
        },
        _ => false,
    }
}

/// Splits a comma-joined image cell into trimmed, non-empty URLs. Arrays written by newer
/// script versions pass through element by element.
pub fn images_from_value(v: &Value) -> Vec<String> {
    match v {
        Value::Array(items) => items
            .iter()
            .map(string_or_default)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => split_images(s),
        _ => Vec::new(),
    }
}

pub fn split_images(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect()
}

//--------------------------------------   ProductFilter     ---------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    /// Every product.
    #[default]
    All,
    /// Only products with the featured flag set.
    Featured,
    /// Exact category name match.
    Category(String),
}

/// The public catalog filter: a category selector combined with a case-insensitive search
/// term matched against name and code. A product must satisfy both.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category: CategoryFilter,
    pub search: String,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        let matches_category = match &self.category {
            CategoryFilter::All => true,
            CategoryFilter::Featured => product.is_featured,
            CategoryFilter::Category(cat) => &product.category == cat,
        };
        let term = self.search.to_lowercase();
        let matches_search = term.is_empty() ||
            product.name.to_lowercase().contains(&term) ||
            product.code.to_lowercase().contains(&term);
        matches_category && matches_search
    }

    pub fn apply<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        products.iter().filter(|p| self.matches(p)).collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn featured_truth_table() {
        for v in
            [json!(true), json!("TRUE"), json!("true"), json!("VERDADERO"), json!("SI"), json!(1), json!(1.0), json!(" si ")]
        {
            assert!(featured_flag(&v), "{v} should be featured");
        }
        for v in [json!(false), json!("FALSE"), json!(""), json!(0), json!(0.0), json!(2), Value::Null, json!("no"), json!([1])] {
            assert!(!featured_flag(&v), "{v} should not be featured");
        }
    }

    #[test]
    fn image_split_join_round_trip() {
        let images = vec!["https://a.cl/1.jpg".to_string(), "https://a.cl/2.jpg".to_string()];
        assert_eq!(split_images(&images.join(",")), images);
        assert_eq!(split_images(" https://a.cl/1.jpg , ,https://a.cl/2.jpg,"), images);
        assert!(split_images("").is_empty());
        assert!(split_images(" , ,").is_empty());
    }

    #[test]
    fn decodes_lowercase_row() {
        let row: Value = serde_json::from_str(include_str!("./test_assets/row_lowercase.json")).unwrap();
        let p = Product::from_row(&row);
        assert_eq!(p.id, "m1abc2def");
        assert_eq!(p.name, "Porcelanato Oslo");
        assert_eq!(p.category, "Porcelanatos");
        assert_eq!(p.yield_m2, 1.44);
        assert_eq!(p.price, Peso::from(18990));
        assert_eq!(p.cost, Peso::from(11500));
        assert_eq!(p.images, vec!["https://drive.google.com/file/d/abc123/view", "https://a.cl/2.png"]);
        assert!(p.is_featured);
        assert_eq!(p.created_at, json!("2024-11-03T14:22:00.000Z"));
    }

    #[test]
    fn decodes_camel_case_and_numeric_strings() {
        let row = json!({
            "id": "  x9  ",
            "name": "Test",
            "price": "12500",
            "yield": "2.5",
            "isFeatured": "Verdadero",
            "createdAt": "yesterday",
            "images": ["https://a.cl/1.jpg", "  ", "https://a.cl/2.jpg "],
        });
        let p = Product::from_row(&row);
        assert_eq!(p.id, "x9");
        assert_eq!(p.price, Peso::from(12500));
        assert_eq!(p.yield_m2, 2.5);
        assert!(p.is_featured);
        assert_eq!(p.created_at, json!("yesterday"));
        assert_eq!(p.images, vec!["https://a.cl/1.jpg", "https://a.cl/2.jpg"]);
        // Untouched fields coerce to their defaults
        assert_eq!(p.category, "");
        assert_eq!(p.cost, Peso::from(0));
        assert!(p.description.is_empty());
    }

    #[test]
    fn decodes_garbage_to_defaults() {
        let p = Product::from_row(&json!({}));
        assert_eq!(p, Product::default());
        let p = Product::from_row(&json!({"price": "not a number", "yield": null, "images": 42}));
        assert_eq!(p.price, Peso::from(0));
        assert_eq!(p.yield_m2, 0.0);
        assert!(p.images.is_empty());
    }

    #[test]
    fn write_payload_shape() {
        let product = Product {
            id: "abc".to_string(),
            name: "Test".to_string(),
            price: Peso::from(1000),
            images: vec!["u1".to_string(), "u2".to_string()],
            is_featured: true,
            ..Product::default()
        };
        let row = product.to_row();
        assert_eq!(row["images"], json!("u1,u2"));
        assert_eq!(row["isFeatured"], json!("TRUE"));
        assert_eq!(row["price"], json!(1000));
        let not_featured = Product::default().to_row();
        assert_eq!(not_featured["isFeatured"], json!("FALSE"));
        assert_eq!(not_featured["images"], json!(""));
    }

    #[test]
    fn fresh_ids_are_distinct() {
        let a = new_product_id();
        let b = new_product_id();
        assert_ne!(a, b);
        assert!(a.len() > 11);
        assert!(a.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    fn sample(name: &str, code: &str, category: &str, featured: bool) -> Product {
        Product {
            name: name.to_string(),
            code: code.to_string(),
            category: category.to_string(),
            is_featured: featured,
            ..Product::default()
        }
    }

    #[test]
    fn filter_semantics() {
        let products = vec![
            sample("Porcelanato Oslo", "PO-01", "Porcelanatos", true),
            sample("Cerámica Lisa", "CL-77", "Cerámicas de Piso", false),
            sample("Piso Roble", "PR-10", "Pisos Flotantes", true),
        ];
        let all = ProductFilter::default();
        assert_eq!(all.apply(&products).len(), 3);

        let featured = ProductFilter { category: CategoryFilter::Featured, ..Default::default() };
        assert_eq!(featured.apply(&products).len(), 2);

        let by_cat = ProductFilter {
            category: CategoryFilter::Category("Cerámicas de Piso".to_string()),
            ..Default::default()
        };
        assert_eq!(by_cat.apply(&products), vec![&products[1]]);

        let search = ProductFilter { search: "oslo".to_string(), ..Default::default() };
        assert_eq!(search.apply(&products), vec![&products[0]]);

        let by_code = ProductFilter { search: "pr-1".to_string(), ..Default::default() };
        assert_eq!(by_code.apply(&products), vec![&products[2]]);

        let both = ProductFilter { category: CategoryFilter::Featured, search: "cerámica".to_string() };
        assert!(both.apply(&products).is_empty());
    }
}
