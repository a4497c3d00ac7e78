use std::time::Duration;

use colored::{Color, Colorize};

use crate::engine::{ExecutionResult, RequestTemplate, RunReport};

pub fn print_report(template: &RequestTemplate, report: &RunReport, elapsed: Duration) {
    println!(
        "{} {}",
        template.method().as_str().bold(),
        template.url().as_str().cyan()
    );
    println!(
        "{} {} {}",
        "Executions:".bold(),
        report.total,
        format!("({:.1} ms)", elapsed.as_secs_f64() * 1000.0).dimmed()
    );
    println!(
        "{} {}  {} {}",
        "Success:".bold(),
        report.success.to_string().green(),
        "Fail:".bold(),
        if report.fail > 0 {
            report.fail.to_string().red()
        } else {
            report.fail.to_string().dimmed()
        }
    );

    if report.unique_results.is_empty() {
        return;
    }

    println!("{}", "Unique results".bold());
    for result in &report.unique_results {
        let occurrences = report
            .all_results
            .iter()
            .filter(|r| r.signature() == result.signature())
            .count();
        println!("  {} {}", format_outcome(result), format!("x{occurrences}").dimmed());
    }
}

fn format_outcome(result: &ExecutionResult) -> String {
    let status = match result.status_code {
        Some(code) => code.to_string().color(status_color(code)).to_string(),
        None => "---".dimmed().to_string(),
    };

    if result.error.is_empty() {
        format!("{} {}", status, preview(&result.body))
    } else {
        format!("{} {}", status, result.error.red())
    }
}

fn status_color(status: u16) -> Color {
    if status >= 400 {
        Color::Red
    } else if status >= 300 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn preview(body: &str) -> String {
    const LIMIT: usize = 80;
    let single_line = body.replace(['\r', '\n'], " ");
    if single_line.chars().count() > LIMIT {
        let cut: String = single_line.chars().take(LIMIT).collect();
        format!("{cut}…")
    } else {
        single_line
    }
}
