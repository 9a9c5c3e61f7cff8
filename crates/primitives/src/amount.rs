//! Fixed-point token amounts.

/// Token amount in subunits. One token is [`SUBUNITS_PER_TOKEN`] subunits.
pub type Amount = u64;

/// Number of subunits in one whole token (10^8, satoshi-style).
pub const SUBUNITS_PER_TOKEN: Amount = 100_000_000;

/// Number of decimal places carried by [`Amount`].
pub const DECIMALS: usize = 8;

/// Renders an amount as a decimal token quantity, e.g. `1.00000000`.
pub fn format_amount(amount: Amount) -> String {
    let whole = amount / SUBUNITS_PER_TOKEN;
    let frac = amount % SUBUNITS_PER_TOKEN;
    format!("{whole}.{frac:0width$}", width = DECIMALS)
}
