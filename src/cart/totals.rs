use super::model::CartView;

/// Total number of units across all lines.
pub fn count(lines: &[CartView]) -> i64 {
    lines
        .iter()
        .fold(0i64, |acc, view| acc.saturating_add(i64::from(view.line.quantity)))
}

/// Sum of unit price times quantity. A line whose product is gone adds 0.
/// Saturates at `i64::MAX` instead of overflowing.
pub fn subtotal(lines: &[CartView]) -> i64 {
    lines.iter().fold(0i64, |acc, view| {
        let unit = view.product.as_ref().map_or(0, |p| p.unit_price());
        acc.saturating_add(unit.saturating_mul(i64::from(view.line.quantity)))
    })
}
