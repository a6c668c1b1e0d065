use std::fs::File;
use std::path::Path;

use anyhow::Result;
use rust_xlsxwriter::{
    Color, Format, FormatAlign, FormatBorder, FormatUnderline, Workbook, Worksheet, XlsxError,
};

use crate::model::{FinalResult, ReportRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<OutputFormat> {
        match name {
            "xlsx" => Some(OutputFormat::Xlsx),
            "csv" => Some(OutputFormat::Csv),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Xlsx => "xlsx",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        }
    }
}

// Visual classification of one score cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    NoData,
    Low,
    Medium,
    High,
}

impl ScoreBand {
    fn fill(self) -> Color {
        match self {
            ScoreBand::NoData => Color::RGB(0xDDDDDD),
            ScoreBand::Low => Color::RGB(0xF8D7DA),
            ScoreBand::Medium => Color::RGB(0xFFF3CD),
            ScoreBand::High => Color::RGB(0xD1E7DD),
        }
    }
}

// Scores above 1 arrive on a 0-100 scale and get brought back to 0-1.
// Applying this twice never changes the result again.
pub fn normalize(score: f64) -> f64 {
    if score > 1.0 {
        score / 100.0
    } else {
        score
    }
}

pub fn band(score: Option<f64>) -> ScoreBand {
    let score = match score {
        Some(s) if !s.is_nan() => normalize(s),
        _ => return ScoreBand::NoData,
    };

    if score < 0.5 {
        ScoreBand::Low
    } else if score < 0.9 {
        ScoreBand::Medium
    } else {
        ScoreBand::High
    }
}

// Groups records by route, keeping the first-seen order of routes and the
// input order of records inside each group.
pub fn group_by_route(reports: &[ReportRecord]) -> Vec<(&str, Vec<&ReportRecord>)> {
    let mut groups: Vec<(&str, Vec<&ReportRecord>)> = Vec::new();
    for report in reports {
        match groups.iter_mut().find(|(route, _)| *route == report.route) {
            Some((_, members)) => members.push(report),
            None => groups.push((report.route.as_str(), vec![report])),
        }
    }
    groups
}

pub fn write_report(result: &FinalResult, path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(result, path)?,
        OutputFormat::Csv => write_csv(result, path)?,
        OutputFormat::Xlsx => write_xlsx(result, path)?,
    }
    Ok(())
}

fn write_json(result: &FinalResult, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, result)?;
    Ok(())
}

const CSV_HEADER: [&str; 12] = [
    "route",
    "screen",
    "url",
    "notes",
    "mobile_performance",
    "mobile_accessibility",
    "mobile_best_practices",
    "mobile_seo",
    "desktop_performance",
    "desktop_accessibility",
    "desktop_best_practices",
    "desktop_seo",
];

fn write_csv(result: &FinalResult, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;

    for (route, members) in group_by_route(&result.reports) {
        for report in members {
            let mut record = vec![
                route.to_string(),
                report.screen.clone(),
                report.url.clone(),
                String::new(),
            ];
            for score in report
                .mobile
                .in_column_order()
                .into_iter()
                .chain(report.desktop.in_column_order())
            {
                record.push(csv_score(score));
            }
            writer.write_record(&record)?;
        }
    }

    writer.flush()?;
    Ok(())
}

// Normalized 0-1 value, empty cell when there is no data
fn csv_score(score: Option<f64>) -> String {
    match score {
        Some(s) if !s.is_nan() => normalize(s).to_string(),
        _ => String::new(),
    }
}

const METRIC_COLUMNS: [&str; 4] = ["Performance", "Accessibility", "Best practices", "SEO"];

fn write_xlsx(result: &FinalResult, path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Report")?;

    write_header(worksheet)?;

    let body = Format::new()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);
    let body_left = Format::new()
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);
    let link = Format::new()
        .set_font_color(Color::RGB(0x0563C1))
        .set_underline(FormatUnderline::Single)
        .set_align(FormatAlign::Left)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);

    let mut row: u32 = 2;
    for (route, members) in group_by_route(&result.reports) {
        let group_start = row;

        // A multi-row group with a named route shows the route once, spanning
        // the whole group; otherwise each row carries its own cell.
        let merged = !route.is_empty() && members.len() > 1;
        if merged {
            let group_end = group_start + members.len() as u32 - 1;
            worksheet.merge_range(group_start, 0, group_end, 0, route, &body)?;
        }

        for report in members {
            if !merged {
                if row == group_start {
                    worksheet.write_with_format(row, 0, route, &body)?;
                } else {
                    worksheet.write_blank(row, 0, &body)?;
                }
            }

            worksheet.write_with_format(row, 1, report.screen.as_str(), &body)?;

            let url = report.url.trim();
            if url.is_empty() {
                worksheet.write_blank(row, 2, &body_left)?;
            } else {
                worksheet.write_url_with_format(row, 2, url, &link)?;
            }

            // placeholder report/notes column
            worksheet.write_blank(row, 3, &body)?;

            let scores = report
                .mobile
                .in_column_order()
                .into_iter()
                .chain(report.desktop.in_column_order());
            for (offset, score) in scores.enumerate() {
                let col = 4 + offset as u16;
                let format = score_format(band(score));
                match score {
                    Some(s) if !s.is_nan() => {
                        worksheet.write_number_with_format(row, col, normalize(s), &format)?
                    }
                    _ => worksheet.write_blank(row, col, &format)?,
                };
            }

            row += 1;
        }
    }

    workbook.save(path)?;
    Ok(())
}

// Two fixed header rows: the four leading cells span both rows, the device
// spans cover their four metric columns each, metric names sit underneath.
fn write_header(worksheet: &mut Worksheet) -> Result<(), XlsxError> {
    let header = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_text_wrap()
        .set_border(FormatBorder::Thin);

    worksheet.merge_range(0, 0, 1, 0, "Route", &header)?;
    worksheet.merge_range(0, 1, 1, 1, "Screens", &header)?;
    worksheet.merge_range(0, 2, 1, 2, "Audited URL", &header)?;
    worksheet.merge_range(0, 3, 1, 3, "PageSpeed / Lighthouse report", &header)?;
    worksheet.merge_range(0, 4, 0, 7, "Mobile", &header)?;
    worksheet.merge_range(0, 8, 0, 11, "Desktop", &header)?;

    for (offset, name) in METRIC_COLUMNS.iter().chain(METRIC_COLUMNS.iter()).enumerate() {
        worksheet.write_with_format(1, 4 + offset as u16, *name, &header)?;
    }

    worksheet.set_column_width(0, 28.0)?;
    worksheet.set_column_width(1, 28.0)?;
    worksheet.set_column_width(2, 45.0)?;
    worksheet.set_column_width(3, 28.0)?;
    for col in 4..=11 {
        worksheet.set_column_width(col, 16.0)?;
    }

    // header rows stay put when the sheet scrolls
    worksheet.set_freeze_panes(2, 0)?;

    Ok(())
}

fn score_format(band: ScoreBand) -> Format {
    Format::new()
        .set_num_format("0%")
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin)
        .set_background_color(band.fill())
}
