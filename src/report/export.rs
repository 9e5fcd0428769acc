//! Exporter-ready tables for a report. Producing an actual file format is left
//! to whoever consumes these sheets.

use serde::Serialize;

use crate::money;
use crate::types::ReportData;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new(name: &str, headers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }
}

impl ReportData {
    /// "Daily Sales", "Summary" and "Status Breakdown" sheets, in that order.
    pub fn to_sheets(&self) -> Vec<Sheet> {
        let mut daily = Sheet::new(
            "Daily Sales",
            &["Date", "Total Sales", "Total Cash", "Average Per Sale"],
        );
        daily.rows = self
            .daily_sales
            .iter()
            .map(|b| {
                vec![
                    b.date.format("%Y-%m-%d").to_string(),
                    b.total_sales.to_string(),
                    money::format_display(b.total_cash),
                    money::format_display(b.average_per_sale),
                ]
            })
            .collect();

        let s = &self.summary;
        let mut summary = Sheet::new("Summary", &["Metric", "Value"]);
        summary.rows = vec![
            vec!["Total Sales".to_string(), s.total_sales.to_string()],
            vec!["Total Paid Sales".to_string(), s.total_paid_sales.to_string()],
            vec!["Total Cash".to_string(), money::format_display(s.total_cash)],
            vec![
                "Average Sale Amount".to_string(),
                money::format_display(s.average_sale_amount),
            ],
        ];

        let mut breakdown = Sheet::new("Status Breakdown", &["Status", "Count"]);
        breakdown.rows = s
            .status_breakdown
            .iter()
            .map(|(status, count)| vec![status.clone(), count.to_string()])
            .collect();

        vec![daily, summary, breakdown]
    }
}
