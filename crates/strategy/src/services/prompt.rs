//! Renders snapshot sections into prompt text. Absent values are written as
//! `unknown` so the evaluator can tell them apart from zero.

use common::models::{PortfolioState, StockSnapshot};

pub const UNKNOWN: &str = "unknown";

pub const MEDIA_CAP: usize = 3;

fn number(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.4}", v))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn basic_info(snapshot: &StockSnapshot) -> String {
    format!(
        "{{Ticker: {}, Latest Price: {}, Latest Volume: {}}}",
        snapshot.ticker(),
        number(snapshot.price()),
        snapshot
            .volume()
            .map(|v| v.to_string())
            .unwrap_or_else(|| UNKNOWN.to_string())
    )
}

pub fn fundamentals(snapshot: &StockSnapshot) -> String {
    let f = snapshot.fundamentals();
    format!(
        "{{PE Ratio: {}, PEG Ratio: {}, ROE: {}, Revenue Growth: {}, EPS Growth: {}, D/E Ratio: {}}}",
        number(f.pe_ratio),
        number(f.peg_ratio),
        number(f.roe),
        number(f.revenue_growth),
        number(f.eps_growth),
        number(f.de_ratio),
    )
}

pub fn technicals(snapshot: &StockSnapshot) -> String {
    let t = snapshot.technicals();
    let macd = t
        .macd
        .map(|m| {
            format!(
                "{{line: {:.4}, signal: {:.4}, histogram: {:.4}}}",
                m.line, m.signal, m.histogram
            )
        })
        .unwrap_or_else(|| UNKNOWN.to_string());
    format!(
        "{{SMA: {}, RSI: {}, MACD: {}}}",
        number(t.sma),
        number(t.rsi),
        macd
    )
}

pub fn news_articles(snapshot: &StockSnapshot) -> String {
    let items: Vec<String> = snapshot
        .news_articles()
        .iter()
        .take(MEDIA_CAP)
        .map(|a| {
            format!(
                "{{title: {}, body: {}}}",
                a.title,
                a.body.as_deref().unwrap_or(UNKNOWN)
            )
        })
        .collect();
    format!("[{}]", items.join(", "))
}

pub fn social_posts(snapshot: &StockSnapshot) -> String {
    let items: Vec<&str> = snapshot
        .social_posts()
        .iter()
        .take(MEDIA_CAP)
        .map(|p| p.text.as_str())
        .collect();
    format!("[{}]", items.join(", "))
}

fn section(name: &str, snapshot: &StockSnapshot) -> Option<String> {
    match name {
        "basic_info" => Some(basic_info(snapshot)),
        "fundamentals" => Some(fundamentals(snapshot)),
        "technicals" => Some(technicals(snapshot)),
        "news_articles" => Some(news_articles(snapshot)),
        "social_posts" => Some(social_posts(snapshot)),
        _ => None,
    }
}

/// Substitutes `{section}` placeholders in one pass over `template`.
///
/// Rendered sections are never scanned again, so media text containing a
/// placeholder is copied verbatim. Unknown `{...}` text is left as is.
pub fn fill_template(template: &str, snapshot: &StockSnapshot) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let rendered = tail
            .find('}')
            .and_then(|close| section(&tail[1..close], snapshot).map(|text| (text, close)));

        match rendered {
            Some((text, close)) => {
                out.push_str(&text);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn portfolio(portfolio: &PortfolioState) -> String {
    serde_json::to_string(portfolio).unwrap_or_else(|_| UNKNOWN.to_string())
}
