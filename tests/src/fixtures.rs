//! CSV fixtures for the ingestion tests.

/// The full required header, in source order.
pub const CSV_HEADER: &str = "order_id,customer_id,email,country,city,product_id,\
product_name,category,price,quantity,discount_amount,created_at";

/// One complete order row with generated customer/product attributes.
pub fn order_row(
    order_id: &str,
    customer_id: &str,
    product_id: &str,
    price: &str,
    quantity: &str,
    discount: &str,
    created_at: &str,
) -> String {
    order_row_in_city(
        order_id,
        customer_id,
        product_id,
        "Austin",
        price,
        quantity,
        discount,
        created_at,
    )
}

/// Like `order_row` but with an explicit city, for dimension
/// convergence scenarios.
#[allow(clippy::too_many_arguments)]
pub fn order_row_in_city(
    order_id: &str,
    customer_id: &str,
    product_id: &str,
    city: &str,
    price: &str,
    quantity: &str,
    discount: &str,
    created_at: &str,
) -> String {
    format!(
        "{order_id},{customer_id},{customer_id}@example.com,US,{city},\
         {product_id},Product {product_id},Gadgets,{price},{quantity},{discount},{created_at}"
    )
}

/// Assemble a full CSV document from the standard header and rows.
pub fn orders_csv(rows: &[String]) -> String {
    let mut doc = String::from(CSV_HEADER);
    for row in rows {
        doc.push('\n');
        doc.push_str(row);
    }
    doc.push('\n');
    doc
}

/// A CSV document with an arbitrary header (schema validation tests).
pub fn csv_with_header(header: &str, rows: &[String]) -> String {
    let mut doc = String::from(header);
    for row in rows {
        doc.push('\n');
        doc.push_str(row);
    }
    doc.push('\n');
    doc
}
