/// Rounds to two decimal places, halves away from zero.
pub fn round2(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// `quantity * price`, rounded for display.
pub fn line_subtotal(quantity: i32, price: f64) -> f64 {
    round2(f64::from(quantity) * price)
}
