use crate::{supply::SupplySnapshot, units::WholeTokens};

const EXPLORER_TOKEN_URL: &str = "https://bscscan.com/token";

const STYLE: &str = r#"<style>
  body { font-family: Arial, sans-serif; margin: 0; padding: 20px; background-color: #f5f5f5; }
  h1 { color: #333; font-size: 32px; margin-bottom: 20px; text-align: center; }
  p { color: #666; font-size: 16px; margin-bottom: 10px; }
  table { border-collapse: collapse; width: 100%; margin-bottom: 20px; background-color: #fff; }
  th, td { border: 1px solid #ddd; padding: 12px; text-align: left; }
  th { background-color: #f9f9f9; font-weight: bold; font-size: 16px; }
  tr:nth-child(even) { background-color: #f2f2f2; }
  a { color: #337ab7; text-decoration: underline; }
  @media screen and (max-width: 600px) {
    h1 { font-size: 24px; }
    th, td { padding: 8px; }
  }
</style>"#;

/// 1234567 -> "1,234,567"
pub fn format_thousands(amount: WholeTokens) -> String {
    let digits = amount.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(digit);
    }

    formatted
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_supply_page(
    snapshot: &SupplySnapshot,
    token_symbol: &str,
    token_contract: &str,
) -> String {
    let symbol = escape_html(token_symbol);
    let metrics = &snapshot.metrics;
    let circulating_supply = format_thousands(metrics.circulating_supply);

    let rows: String = snapshot
        .balances
        .iter()
        .map(|raw| {
            let holder = &raw.holder;
            format!(
                r#"<tr>
  <td><a href="{EXPLORER_TOKEN_URL}/{token_contract}?a={address}" target="_blank">{address}</a></td>
  <td>{balance}</td>
  <td>{chain}</td>
  <td>{category}</td>
  <td>{wallet_label}</td>
</tr>
"#,
                address = holder.address,
                balance = format_thousands(raw.balance.whole_tokens()),
                chain = holder.chain,
                category = escape_html(&holder.category),
                wallet_label = escape_html(&holder.wallet_label),
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>${symbol} Circulating Supply</title>
{STYLE}
</head>
<body>
<h1>${symbol} Circulating Supply Tracker</h1>
<p>Total Supply: {max_supply}</p>
<p>Burnt ${symbol}: {burnt_tokens}</p>
<p>Live Circulating Supply of ${symbol}: {circulating_supply}</p>
<p>Updated: {fetched_at}</p>
<table>
<tr>
  <th>Contract Address</th>
  <th>Balance ({symbol})</th>
  <th>Chain</th>
  <th>Type</th>
  <th>Name</th>
</tr>
{rows}<tr><td colspan="5"></td></tr>
<tr>
  <td>${symbol} Circulating Supply</td>
  <td>{circulating_supply}</td>
  <td></td>
  <td></td>
  <td></td>
</tr>
</table>
</body>
</html>
"#,
        max_supply = format_thousands(metrics.max_supply),
        burnt_tokens = format_thousands(metrics.burnt_tokens),
        fetched_at = snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}
