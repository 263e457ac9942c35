use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::models::{PaymentMethod, Sale, ShiftReport};
use crate::settings::Settings;
use crate::shifts::{CashVariance, VarianceLabel};

/// Header and footer shared by every document.
#[derive(Debug, Clone, Serialize)]
pub struct LayoutConfig {
    pub business_name: String,
    pub location: Option<String>,
    pub footer_text: Option<String>,
    pub show_tax: bool,
    pub print_discount_reasons: bool,
    pub print_notes: bool,
}

impl LayoutConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        let non_empty = |v: &str| Some(v.trim().to_string()).filter(|v| !v.is_empty());
        Self {
            business_name: settings.business_name.clone(),
            location: non_empty(&settings.location),
            footer_text: non_empty(&settings.receipt_footer),
            show_tax: settings.should_apply_tax,
            print_discount_reasons: settings.print_discount_reasons,
            print_notes: settings.print_notes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReceiptDoc {
    pub sale_id: String,
    pub created_at: String,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub debtor_name: Option<String>,
    pub is_debt: bool,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: f64,
    pub discount: f64,
    pub discount_reason: Option<String>,
    pub tax_rate: f64,
    pub tax_amount: f64,
    pub final_total: f64,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl ReceiptDoc {
    pub fn from_sale(sale: &Sale) -> Self {
        let after_discount = sale.total - sale.discount;
        Self {
            sale_id: sale.id.clone(),
            created_at: format_timestamp(sale.created_at),
            customer_name: sale.customer_name.clone(),
            customer_phone: sale.customer_phone.clone(),
            debtor_name: sale.debtor_name.clone(),
            is_debt: sale.is_debt,
            lines: sale
                .items
                .iter()
                .map(|item| ReceiptLine {
                    name: item.product.name.clone(),
                    quantity: item.quantity,
                    unit_price: item.price,
                    total: item.line_total(),
                })
                .collect(),
            subtotal: sale.total,
            discount: sale.discount,
            discount_reason: sale.discount_reason.clone(),
            tax_rate: sale.tax,
            tax_amount: after_discount * sale.tax / 100.0,
            final_total: sale.final_total,
            payment_method: sale.payment_method,
            notes: sale.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShiftReportDoc {
    pub report_id: String,
    pub date: String,
    pub sales_count: usize,
    pub total_sales: f64,
    pub cash_sales: f64,
    pub card_sales: f64,
    pub debt_sales: f64,
    pub expenses: f64,
    pub expected_cash: f64,
    pub counted_cash: f64,
    pub variance: f64,
    pub variance_label: VarianceLabel,
    pub paid_debts: Vec<(String, f64)>,
    pub notes: Option<String>,
}

impl ShiftReportDoc {
    pub fn from_report(report: &ShiftReport) -> Self {
        let variance =
            CashVariance::compute(report.total_cash_sales, report.expenses, report.cash_in_drawer);
        Self {
            report_id: report.id.clone(),
            date: format_timestamp(report.date),
            sales_count: report.sales_count,
            total_sales: report.total_sales,
            cash_sales: report.total_cash_sales,
            card_sales: report.total_card_sales,
            debt_sales: report.total_debt_sales,
            expenses: report.expenses,
            expected_cash: variance.adjusted_expected,
            counted_cash: report.cash_in_drawer,
            variance: report.cash_shortage,
            variance_label: variance.label(),
            paid_debts: report
                .paid_debts
                .iter()
                .map(|s| (s.debtor_name.clone().unwrap_or_default(), s.final_total))
                .collect(),
            notes: Some(report.notes.trim().to_string()).filter(|n| !n.is_empty()),
        }
    }
}

fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn payment_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "Cash",
        PaymentMethod::Card => "Card",
        PaymentMethod::Debt => "Debt",
        PaymentMethod::Other => "Other",
    }
}

fn line(label: &str, value: &str) -> String {
    format!(
        "<div class=\"line\"><span>{}</span><span>{}</span></div>",
        esc(label),
        value
    )
}

fn header(cfg: &LayoutConfig, title: Option<&str>, date: &str) -> String {
    let mut body = format!(
        "<div class=\"center\"><strong>{}</strong></div>",
        esc(&cfg.business_name)
    );
    if let Some(location) = &cfg.location {
        body.push_str(&format!("<div class=\"center\">{}</div>", esc(location)));
    }
    if let Some(title) = title {
        body.push_str(&format!("<div class=\"center\"><strong>{}</strong></div>", esc(title)));
    }
    body.push_str(&format!("<div class=\"center note\">{}</div>", esc(date)));
    body
}

fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<title>{}</title>
<style>
body {{ font-family: ui-monospace, SFMono-Regular, Menlo, monospace; margin: 0; padding: 12px; background: #fff; color: #111; max-width: 80mm; }}
.line {{ display: flex; justify-content: space-between; gap: 8px; font-size: 10px; }}
.line strong {{ font-size: 11px; }}
.section {{ margin-top: 8px; border-top: 1px dashed #111; padding-top: 6px; }}
.section h3 {{ margin: 0 0 4px 0; font-size: 11px; text-transform: uppercase; }}
.note {{ color: #666; font-size: 9px; }}
.center {{ text-align: center; }}
</style>
</head>
<body>{}</body>
</html>"#,
        esc(title),
        body
    )
}

pub fn render_receipt_html(doc: &ReceiptDoc, cfg: &LayoutConfig) -> String {
    let mut body = header(cfg, None, &doc.created_at);
    body.push_str(&format!(
        "<div class=\"center note\">Receipt #{}</div>",
        esc(&doc.sale_id)
    ));

    let mut customer = String::new();
    if let Some(name) = &doc.customer_name {
        customer.push_str(&line("Customer", &esc(name)));
    }
    if let Some(phone) = &doc.customer_phone {
        customer.push_str(&line("Phone", &esc(phone)));
    }
    if doc.is_debt {
        customer.push_str(&line("Sale type", "<strong>Debt</strong>"));
        if let Some(debtor) = &doc.debtor_name {
            customer.push_str(&line("Debtor", &esc(debtor)));
        }
    }
    if !customer.is_empty() {
        body.push_str(&format!("<div class=\"section\">{customer}</div>"));
    }

    body.push_str("<div class=\"section\"><h3>Items</h3>");
    if doc.lines.is_empty() {
        body.push_str("<div class=\"note\">No items</div>");
    }
    for l in &doc.lines {
        body.push_str(&format!(
            "<div class=\"line\"><span>{}x {} @ {}</span><span>{}</span></div>",
            l.quantity,
            esc(&l.name),
            money(l.unit_price),
            money(l.total)
        ));
    }
    body.push_str("</div>");

    body.push_str("<div class=\"section\">");
    body.push_str(&line("Subtotal", &money(doc.subtotal)));
    if doc.discount > 0.0 {
        body.push_str(&line("Discount", &format!("-{}", money(doc.discount))));
        if cfg.print_discount_reasons {
            if let Some(reason) = &doc.discount_reason {
                body.push_str(&format!(
                    "<div class=\"note\">Discount reason: {}</div>",
                    esc(reason)
                ));
            }
        }
    }
    if cfg.show_tax && doc.tax_rate > 0.0 {
        body.push_str(&line(
            &format!("Tax ({}%)", doc.tax_rate),
            &money(doc.tax_amount),
        ));
    }
    body.push_str(&line(
        "Total",
        &format!("<strong>{}</strong>", money(doc.final_total)),
    ));
    body.push_str(&line("Payment", payment_label(doc.payment_method)));
    body.push_str("</div>");

    if cfg.print_notes {
        if let Some(notes) = &doc.notes {
            body.push_str(&format!(
                "<div class=\"section note\">Notes: {}</div>",
                esc(notes)
            ));
        }
    }
    if let Some(footer) = &cfg.footer_text {
        body.push_str(&format!(
            "<div class=\"section center\">{}</div>",
            esc(footer)
        ));
    }
    html_shell("Receipt", &body)
}

pub fn render_shift_report_html(doc: &ShiftReportDoc, cfg: &LayoutConfig) -> String {
    let mut body = header(cfg, Some("SHIFT REPORT"), &doc.date);

    body.push_str("<div class=\"section\">");
    body.push_str(&line("Sales", &doc.sales_count.to_string()));
    body.push_str(&line(
        "Total sales",
        &format!("<strong>{}</strong>", money(doc.total_sales)),
    ));
    body.push_str("</div><div class=\"section\"><h3>By payment</h3>");
    body.push_str(&line("Cash", &money(doc.cash_sales)));
    body.push_str(&line("Card", &money(doc.card_sales)));
    body.push_str(&line("Debt / other", &money(doc.debt_sales)));
    body.push_str("</div><div class=\"section\"><h3>Drawer</h3>");
    if doc.expenses > 0.0 {
        body.push_str(&line("Expenses", &format!("-{}", money(doc.expenses))));
    }
    body.push_str(&line("Expected", &money(doc.expected_cash)));
    body.push_str(&line("Counted", &money(doc.counted_cash)));
    let label = match doc.variance_label {
        VarianceLabel::Matched => "Matched",
        VarianceLabel::Surplus => "Surplus",
        VarianceLabel::Shortage => "Shortage",
    };
    body.push_str(&line(
        &format!("Variance ({label})"),
        &money(doc.variance.abs()),
    ));
    body.push_str("</div>");

    if !doc.paid_debts.is_empty() {
        body.push_str("<div class=\"section\"><h3>Debts paid</h3>");
        for (debtor, amount) in &doc.paid_debts {
            body.push_str(&line(debtor, &money(*amount)));
        }
        body.push_str("</div>");
    }
    if let Some(notes) = &doc.notes {
        body.push_str(&format!(
            "<div class=\"section\"><h3>Notes</h3><div>{}</div></div>",
            esc(notes)
        ));
    }
    html_shell("Shift Report", &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::fixtures::*;

    fn discounted_sale() -> Sale {
        let p = product("p1", 10.0, 5);
        let mut s = sale_with_line("s1", &p, 2);
        s.discount = 5.0;
        s.discount_reason = Some("damaged <box>".into());
        s.notes = Some("deliver later".into());
        s.tax = 10.0;
        s.final_total = 16.5;
        s.customer_name = Some("Sara".into());
        s
    }

    #[test]
    fn receipt_respects_print_flags() {
        let sale = discounted_sale();
        let doc = ReceiptDoc::from_sale(&sale);
        assert_eq!(doc.tax_amount, 1.5);

        let mut settings = Settings::default();
        let html = render_receipt_html(&doc, &LayoutConfig::from_settings(&settings));
        assert!(html.contains("Nora Cleaning Supplies"));
        assert!(html.contains("2x Product p1 @ 10.00"));
        assert!(html.contains("-5.00"));
        assert!(!html.contains("Discount reason"));
        assert!(!html.contains("deliver later"));
        assert!(!html.contains("Tax ("));
        assert!(html.contains("Thank you for your visit"));

        settings.print_discount_reasons = true;
        settings.print_notes = true;
        settings.should_apply_tax = true;
        let html = render_receipt_html(&doc, &LayoutConfig::from_settings(&settings));
        assert!(html.contains("Discount reason: damaged &lt;box&gt;"));
        assert!(html.contains("Notes: deliver later"));
        assert!(html.contains("Tax (10%)"));
        assert!(html.contains("16.50"));
    }

    #[test]
    fn debt_receipt_names_debtor() {
        let s = debt_sale("d1", "Ali", 12.0);
        let html = render_receipt_html(
            &ReceiptDoc::from_sale(&s),
            &LayoutConfig::from_settings(&Settings::default()),
        );
        assert!(html.contains("<strong>Debt</strong>"));
        assert!(html.contains("Ali"));
        assert!(html.contains("No items"));
    }

    #[test]
    fn shift_report_shows_variance_label() {
        let report = ShiftReport {
            id: "r1".into(),
            date: ts(10, 18),
            sales_count: 3,
            total_sales: 120.0,
            total_cash_sales: 40.0,
            total_card_sales: 60.0,
            total_debt_sales: 20.0,
            cash_in_drawer: 30.0,
            cash_shortage: -5.0,
            expenses: 5.0,
            paid_debts: vec![debt_sale("p", "Omar", 8.0)],
            notes: "busy".into(),
        };
        let doc = ShiftReportDoc::from_report(&report);
        assert_eq!(doc.expected_cash, 35.0);
        assert_eq!(doc.variance_label, VarianceLabel::Shortage);

        let html = render_shift_report_html(&doc, &LayoutConfig::from_settings(&Settings::default()));
        assert!(html.contains("SHIFT REPORT"));
        assert!(html.contains("Variance (Shortage)"));
        assert!(html.contains("5.00"));
        assert!(html.contains("Omar"));
        assert!(html.contains("busy"));
    }
}
