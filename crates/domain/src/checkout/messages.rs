//! Confirmation and alert bodies sent after an order is placed.

use chrono::FixedOffset;
use serde_json::json;
use store::Order;

use crate::cart::CartItem;

pub(crate) fn customer_subject(store_name: &str, order: &Order) -> String {
    format!("Order confirmation #{} - {}", order.id, store_name)
}

pub(crate) fn customer_html(order: &Order, offset: FixedOffset) -> String {
    format!(
        "<h1>Thank you for your order, {name}!</h1>\
         <p>We received your order <strong>#{id}</strong> on {placed}.</p>\
         <p>We will contact you soon at {phone} or at this address to arrange delivery and payment.</p>\
         <hr>\
         <p><strong>Order total:</strong> {total}</p>\
         <p><strong>Requested date:</strong> {date}</p>\
         <p><strong>Notes:</strong> {notes}</p>",
        name = escape_html(&order.customer_name),
        id = order.id,
        placed = order
            .order_date
            .with_timezone(&offset)
            .format("%Y-%m-%d %H:%M"),
        phone = escape_html(&order.customer_phone),
        total = order.total,
        date = order.requested_delivery_date.format("%Y-%m-%d"),
        notes = escape_html(order.notes.as_deref().unwrap_or("")),
    )
}

/// Dynamic data handed to the provider's confirmation template.
pub(crate) fn customer_template_data(
    order: &Order,
    items: &[CartItem],
    offset: FixedOffset,
) -> serde_json::Value {
    let items: Vec<_> = items
        .iter()
        .map(|item| {
            json!({
                "name": item.name,
                "quantity": item.quantity,
                "unit_price": item.unit_price.to_string(),
                "subtotal": item.subtotal().to_string(),
            })
        })
        .collect();

    json!({
        "order_id": order.id,
        "order_date": order.order_date.with_timezone(&offset).to_rfc3339(),
        "total": order.total.to_string(),
        "requested_delivery_date": order.requested_delivery_date.format("%Y-%m-%d").to_string(),
        "notes": order.notes,
        "customer_name": order.customer_name,
        "items": items,
    })
}

pub(crate) fn admin_subject(order: &Order) -> String {
    format!("New order received #{}", order.id)
}

pub(crate) fn admin_html(order: &Order) -> String {
    format!(
        "<h1>New order!</h1>\
         <p>Order #{id} was just placed.</p>\
         <p><strong>Customer:</strong> {name} ({email})</p>\
         <p><strong>Total:</strong> {total}</p>\
         <p><strong>Notes:</strong> {notes}</p>\
         <p>Open the active orders panel to handle it.</p>",
        id = order.id,
        name = escape_html(&order.customer_name),
        email = escape_html(&order.customer_email),
        total = order.total,
        notes = escape_html(order.notes.as_deref().unwrap_or("")),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
