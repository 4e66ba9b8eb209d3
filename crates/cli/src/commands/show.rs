//! Cart rendering for the terminal.

use std::io::{self, Write};

use rocketshoes_core::{Cart, LineItem, format_price};

const TITLE_WIDTH: usize = 40;

/// Shown in place of an amount too large to compute.
const UNAVAILABLE: &str = "n/a";

/// Write the cart as a table with subtotals and a grand total.
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn render(cart: &Cart, out: &mut impl Write) -> io::Result<()> {
    if cart.is_empty() {
        return writeln!(out, "Cart is empty");
    }

    writeln!(
        out,
        "{:>5}  {:<TITLE_WIDTH$}  {:>4}  {:>10}  {:>11}",
        "ID", "PRODUCT", "QTY", "PRICE", "SUBTOTAL"
    )?;
    for item in cart {
        render_line(item, out)?;
    }
    writeln!(
        out,
        "\n{} products, {} units, total {}",
        cart.len(),
        cart.total_quantity(),
        cart.total().map_or_else(|| UNAVAILABLE.to_string(), format_price)
    )
}

fn render_line(item: &LineItem, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{:>5}  {:<TITLE_WIDTH$}  {:>4}  {:>10}  {:>11}",
        item.id(),
        truncate(&item.product.title, TITLE_WIDTH),
        item.amount,
        format_price(item.product.price),
        item.subtotal()
            .map_or_else(|| UNAVAILABLE.to_string(), format_price)
    )
}

fn truncate(title: &str, width: usize) -> String {
    if title.chars().count() <= width {
        return title.to_string();
    }
    let mut short: String = title.chars().take(width.saturating_sub(1)).collect();
    short.push('…');
    short
}
