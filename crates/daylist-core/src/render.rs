use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use regex::RegexBuilder;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::datetime::format_due;
use crate::filter::{ViewCounts, empty_state_message};
use crate::task::{ActiveView, List, SmartView, Task};

const SMART_VIEWS: [SmartView; 5] = [
    SmartView::MyDay,
    SmartView::Important,
    SmartView::Planned,
    SmartView::Assigned,
    SmartView::All,
];

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    /// Prints the visible tasks of the active view, or its
    /// empty-state message when nothing survives filtering.
    #[tracing::instrument(skip(self, tasks, lists, today))]
    pub fn print_view(
        &mut self,
        tasks: &[&Task],
        lists: &[List],
        view: &ActiveView,
        query: &str,
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if tasks.is_empty() {
            writeln!(out, "{}", empty_state_message(view, query))?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            "Done".to_string(),
            "Due".to_string(),
            "Task".to_string(),
            "List".to_string(),
            "Marks".to_string(),
        ];

        let mut rows = Vec::with_capacity(tasks.len());

        for task in tasks {
            let id = self.paint(&task.id.to_string(), "33");
            let done = if task.completed { "x" } else { "" }.to_string();

            let due = task.due_date.map(format_due).unwrap_or_default();
            let due = if let Some(date) = task.due_date {
                if date < today {
                    self.paint(&due, "31")
                } else {
                    due
                }
            } else {
                due
            };

            let text = self.highlight(&task.text, query);
            let text = if task.completed {
                self.paint(&text, "2")
            } else {
                text
            };

            let list = lists
                .iter()
                .find(|l| l.id == task.list_id)
                .map(|l| l.name.clone())
                .unwrap_or_default();

            let mut marks = Vec::new();
            if task.important {
                marks.push("+star");
            }
            if task.my_day {
                marks.push("+day");
            }
            if task.is_assigned_to_me() {
                marks.push("+me");
            }

            rows.push(vec![id, done, due, text, list, marks.join(" ")]);
        }

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    /// Prints the sidebar: smart views, then custom lists, each with
    /// its count of incomplete tasks. The active selection is marked.
    #[tracing::instrument(skip(self, lists, counts))]
    pub fn print_sidebar(
        &mut self,
        lists: &[List],
        counts: &ViewCounts,
        active: &ActiveView,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let mut rows = Vec::new();
        for view in SMART_VIEWS {
            let marker = if *active == ActiveView::Smart(view) {
                ">"
            } else {
                ""
            };
            let count = counts.for_smart(view);
            rows.push(vec![
                marker.to_string(),
                view.as_str().to_string(),
                view.title().to_string(),
                if count > 0 {
                    count.to_string()
                } else {
                    String::new()
                },
            ]);
        }

        for list in lists {
            let marker = if *active == ActiveView::List(list.id) {
                ">"
            } else {
                ""
            };
            let count = counts.for_list(list.id);
            rows.push(vec![
                marker.to_string(),
                list.id.to_string(),
                list.name.clone(),
                if count > 0 {
                    count.to_string()
                } else {
                    String::new()
                },
            ]);
        }

        let headers = vec![
            String::new(),
            "View".to_string(),
            "Name".to_string(),
            "Open".to_string(),
        ];
        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    /// Paints case-insensitive matches of the search query within the
    /// task text.
    fn highlight(&self, text: &str, query: &str) -> String {
        if query.trim().is_empty() {
            return text.to_string();
        }

        let built = RegexBuilder::new(&regex::escape(query.trim()))
            .case_insensitive(true)
            .build();
        match built {
            Ok(re) => re
                .replace_all(text, |caps: &regex::Captures<'_>| self.paint(&caps[0], "1;33"))
                .into_owned(),
            Err(_) => text.to_string(),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
