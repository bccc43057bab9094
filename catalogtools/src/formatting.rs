use std::fmt::Write;

use anyhow::Result;
use prettytable::{
    format::{LinePosition, LineSeparator, TableFormat},
    row,
    Table,
};
use sheet_store::{direct_image_url, Product};

/// The storefront's WhatsApp contact number, used when nothing else is configured.
pub const DEFAULT_WHATSAPP_NUMBER: &str = "56979796666";

fn markdown_format() -> TableFormat {
    prettytable::format::FormatBuilder::new()
        .column_separator('|')
        .borders('|')
        .separator(LinePosition::Title, LineSeparator::new('-', '|', '|', '|'))
        .padding(1, 1)
        .build()
}

fn markdown_style(table: &mut Table) {
    table.set_format(markdown_format());
}

/// Renders the catalog as a table. `private` adds the columns that never appear in public
/// views (cost and provider).
pub fn format_catalog(products: &[&Product], private: bool) -> String {
    let mut table = Table::new();
    markdown_style(&mut table);
    if private {
        table.set_titles(row!["Id", "Name", "Code", "Category", "Format", "m²/box", "Price/m²", "Cost", "Provider", "★"]);
        for p in products {
            table.add_row(row![
                p.id,
                p.name,
                p.code,
                p.category,
                p.format,
                format!("{:.2}", p.yield_m2),
                p.price,
                p.cost,
                p.provider,
                featured_mark(p)
            ]);
        }
    } else {
        table.set_titles(row!["Name", "Code", "Category", "Format", "m²/box", "Price/m²", "★"]);
        for p in products {
            table.add_row(row![p.name, p.code, p.category, p.format, format!("{:.2}", p.yield_m2), p.price, featured_mark(p)]);
        }
    }
    table.to_string()
}

/// The full detail block for one product, images rewritten to directly loadable URLs.
pub fn format_product(product: &Product, private: bool) -> Result<String> {
    let mut f = String::new();
    writeln!(f, "===============================================================================")?;
    writeln!(f, "{} {}", product.name, featured_mark(product))?;
    writeln!(f, "===============================================================================")?;
    writeln!(f, "Id:          {}", product.id)?;
    writeln!(f, "Code:        {}", dash_if_empty(&product.code))?;
    writeln!(f, "Category:    {}", dash_if_empty(&product.category))?;
    writeln!(f, "Format:      {}", dash_if_empty(&product.format))?;
    writeln!(f, "Finish:      {}", dash_if_empty(&product.finish))?;
    writeln!(f, "Yield:       {} m²/box", product.yield_m2)?;
    writeln!(f, "Price:       {} per m²", product.price)?;
    if private {
        writeln!(f, "Cost:        {}", product.cost)?;
        writeln!(f, "Provider:    {}", dash_if_empty(&product.provider))?;
    }
    writeln!(f, "Description: {}", dash_if_empty(&product.description))?;
    if product.images.is_empty() {
        writeln!(f, "Images:      -")?;
    } else {
        writeln!(f, "Images:")?;
        for url in &product.images {
            writeln!(f, "  {}", direct_image_url(url))?;
        }
    }
    Ok(f)
}

/// The public contact flow: a wa.me link with a pre-filled message naming the product.
pub fn whatsapp_link(product: &Product, number: &str) -> String {
    let message =
        format!("Hola, estoy interesado en el producto: {} (Código: {})", product.name, dash_if_empty(&product.code));
    format!("https://wa.me/{number}?text={}", urlencoding::encode(&message))
}

fn featured_mark(product: &Product) -> &'static str {
    if product.is_featured {
        "★"
    } else {
        ""
    }
}

fn dash_if_empty(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

#[cfg(test)]
mod test {
    use catalog_common::Peso;

    use super::*;

    fn sample() -> Product {
        Product {
            id: "m1abc".to_string(),
            name: "Porcelanato Oslo".to_string(),
            code: "PO-60".to_string(),
            category: "Porcelanatos".to_string(),
            price: Peso::from(18990),
            cost: Peso::from(11500),
            provider: "Importadora Andes".to_string(),
            is_featured: true,
            ..Product::default()
        }
    }

    #[test]
    fn public_table_hides_private_columns() {
        let product = sample();
        let table = format_catalog(&[&product], false);
        assert!(table.contains("Porcelanato Oslo"));
        assert!(table.contains("$18.990"));
        assert!(!table.contains("$11.500"));
        assert!(!table.contains("Importadora Andes"));
    }

    #[test]
    fn private_table_shows_cost_and_provider() {
        let product = sample();
        let table = format_catalog(&[&product], true);
        assert!(table.contains("$11.500"));
        assert!(table.contains("Importadora Andes"));
    }

    #[test]
    fn contact_link_is_url_encoded() {
        let link = whatsapp_link(&sample(), DEFAULT_WHATSAPP_NUMBER);
        assert!(link.starts_with("https://wa.me/56979796666?text="));
        assert!(link.contains("Porcelanato%20Oslo"));
        assert!(!link.contains(' '));
    }

    #[test]
    fn missing_code_renders_as_dash_in_contact_message() {
        let mut product = sample();
        product.code = String::new();
        let link = whatsapp_link(&product, DEFAULT_WHATSAPP_NUMBER);
        let decoded = urlencoding::decode(link.split("text=").nth(1).unwrap()).unwrap();
        assert!(decoded.contains("(Código: -)"));
    }
}
