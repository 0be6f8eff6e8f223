//! Number rendering for user-facing messages.

const MAX_FRACTION_DIGITS: u32 = 3;

/// Renders an amount in the Indonesian locale: `.` groups thousands and `,`
/// separates at most three fraction digits (trailing zeros dropped).
pub fn group_thousands_id(amount: f64) -> String {
    if amount.is_nan() {
        return "NaN".to_string();
    }
    if amount.is_infinite() {
        return if amount < 0.0 { "-∞" } else { "∞" }.to_string();
    }

    let scale = 10u128.pow(MAX_FRACTION_DIGITS);
    let scaled = (amount.abs() * scale as f64).round() as u128;
    let whole = (scaled / scale).to_string();
    let fraction = scaled % scale;

    let mut out = String::with_capacity(whole.len() + whole.len() / 3 + 6);
    if amount < 0.0 && scaled != 0 {
        out.push('-');
    }
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(digit);
    }
    if fraction != 0 {
        let digits = format!("{fraction:0width$}", width = MAX_FRACTION_DIGITS as usize);
        out.push(',');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// `Rp 150.000` style rendering of an IDR balance.
pub fn format_rupiah(amount: f64) -> String {
    format!("Rp {}", group_thousands_id(amount))
}
