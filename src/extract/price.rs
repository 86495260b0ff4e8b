use crate::profile::PriceFormat;

/// Normalizes raw price text into a numeric value
///
/// Every character that is not a digit, comma, or period is stripped. For
/// the european format, periods are thousands separators and the comma is
/// the decimal point; for the standard format, commas are thousands
/// separators. Text that does not parse to a finite, non-negative number
/// normalizes to `0.0`, which callers treat as invalid.
///
/// # Examples
///
/// ```
/// use prospector::extract::normalize_price;
/// use prospector::profile::PriceFormat;
///
/// assert_eq!(normalize_price("1.299,50 kr", PriceFormat::European), 1299.50);
/// assert_eq!(normalize_price("$1,299.50", PriceFormat::Standard), 1299.50);
/// assert_eq!(normalize_price("call for price", PriceFormat::Standard), 0.0);
/// ```
pub fn normalize_price(raw: &str, format: PriceFormat) -> f64 {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    if filtered.is_empty() {
        return 0.0;
    }

    let numeric = match format {
        PriceFormat::European => filtered.replace('.', "").replace(',', "."),
        PriceFormat::Standard => filtered.replace(',', ""),
    };

    match numeric.parse::<f64>() {
        Ok(price) if price.is_finite() && price >= 0.0 => price,
        _ => 0.0,
    }
}
