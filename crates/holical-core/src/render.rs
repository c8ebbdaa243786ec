use std::fmt;
use std::io::{self, IsTerminal, Write};
use std::str::FromStr;

use anyhow::{Context, anyhow};
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::grid::{DayClass, MonthGrid, TitleParts};
use crate::holiday::Holiday;
use crate::i18n::{Language, Translation};
use crate::stats::{Countdown, MonthStats};

const CELL_WIDTH: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(anyhow!("invalid theme: {other} (expected light or dark)")),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("light"),
            Self::Dark => f.write_str("dark"),
        }
    }
}

type Rgb = (u8, u8, u8);

#[derive(Debug, Clone, Copy)]
struct Palette {
    holiday: Rgb,
    tx: Rgb,
    weekend: Rgb,
    today: Rgb,
    today_text: Rgb,
}

impl Theme {
    fn palette(self) -> Palette {
        match self {
            Self::Light => Palette {
                holiday: (0xff, 0x4d, 0x4f),
                tx: (0xff, 0xa9, 0x40),
                weekend: (0xff, 0xa9, 0x40),
                today: (0x18, 0x90, 0xff),
                today_text: (0xff, 0xff, 0xff),
            },
            Self::Dark => Palette {
                holiday: (0xff, 0x78, 0x75),
                tx: (0xff, 0xc0, 0x69),
                weekend: (0xff, 0xc0, 0x69),
                today: (0x69, 0xc0, 0xff),
                today_text: (0x14, 0x14, 0x14),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeekLabels {
    Short,
    Long,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    theme: Theme,
    language: Language,
    week_labels: WeekLabels,
}

impl Renderer {
    pub fn new(cfg: &Config, language: Language, theme: Theme) -> anyhow::Result<Self> {
        let always = cfg
            .get("color")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("always"));
        let color = if always {
            true
        } else {
            let on = cfg
                .get_bool("color")
                .context("invalid color setting")?
                .unwrap_or(true);
            on && io::stdout().is_terminal()
        };

        let week_labels = match cfg.get("week.labels").as_deref() {
            None | Some("short") => WeekLabels::Short,
            Some("long") => WeekLabels::Long,
            Some(other) => return Err(anyhow!("invalid week.labels setting: {other}")),
        };

        Ok(Self {
            color,
            theme,
            language,
            week_labels,
        })
    }

    pub fn plain(language: Language) -> Self {
        Self {
            color: false,
            theme: Theme::Light,
            language,
            week_labels: WeekLabels::Short,
        }
    }

    fn text(&self) -> &'static Translation {
        self.language.translation()
    }

    #[tracing::instrument(skip(self, grid), fields(year = grid.year, month = grid.month))]
    pub fn print_month(&self, grid: &MonthGrid) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_month(&mut out, grid)
    }

    pub fn write_month<W: Write>(&self, mut out: W, grid: &MonthGrid) -> anyhow::Result<()> {
        let text = self.text();
        let labels = match self.week_labels {
            WeekLabels::Short => &text.weekdays_short,
            WeekLabels::Long => &text.weekdays_long,
        };
        let cell_width = labels
            .iter()
            .map(|label| UnicodeWidthStr::width(*label) + 1)
            .max()
            .unwrap_or(CELL_WIDTH)
            .max(CELL_WIDTH);
        let row_width = cell_width * 7;

        let title = self.language.title(grid.title_parts());
        writeln!(out, "{}", center(&title, row_width))?;

        for (idx, label) in labels.iter().enumerate() {
            let cell = pad_left(label, cell_width);
            if idx >= 5 {
                write!(out, "{}", self.paint(&cell, self.theme.palette().weekend, false))?;
            } else {
                write!(out, "{cell}")?;
            }
        }
        writeln!(out)?;

        for week in grid.weeks() {
            for slot in week {
                match slot {
                    Some(day) => {
                        let cell = self.day_cell(day.day_number, day.classification, cell_width);
                        write!(out, "{cell}")?;
                    }
                    None => write!(out, "{}", " ".repeat(cell_width))?,
                }
            }
            writeln!(out)?;
        }

        writeln!(out)?;
        writeln!(out, "{}", self.legend())?;
        Ok(())
    }

    fn day_cell(&self, day_number: u32, class: DayClass, width: usize) -> String {
        if !self.color {
            let body = format!("{day_number}{}", marker(class));
            return pad_left(&body, width);
        }

        let body = day_number.to_string();
        let padding = " ".repeat(width.saturating_sub(body.len()));
        format!("{padding}{}", self.painted_label(class, &body))
    }

    fn legend(&self) -> String {
        let text = self.text();
        [
            DayClass::Today,
            DayClass::Holiday,
            DayClass::CompensatoryWorkday,
            DayClass::Weekend,
        ]
        .into_iter()
        .map(|class| {
            let label = text.class_label(class);
            if self.color {
                self.painted_label(class, label)
            } else {
                format!("{} {label}", marker(class).trim())
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
    }

    fn painted_label(&self, class: DayClass, label: &str) -> String {
        let palette = self.theme.palette();
        match class {
            DayClass::Today => self.paint_today(label, palette),
            DayClass::Holiday => self.paint(label, palette.holiday, true),
            DayClass::CompensatoryWorkday => self.paint(label, palette.tx, true),
            DayClass::Weekend => self.paint(label, palette.weekend, false),
            DayClass::Normal => label.to_string(),
        }
    }

    #[tracing::instrument(skip(self, stats))]
    pub fn print_stats(&self, title: TitleParts, stats: &MonthStats) -> anyhow::Result<()> {
        let text = self.text();
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.language.title(title))?;

        let rows = vec![
            vec![text.stats_total.to_string(), stats.total_days.to_string()],
            vec![text.stats_work.to_string(), stats.work_days.to_string()],
            vec![text.weekend.to_string(), stats.weekend_days.to_string()],
            vec![text.holiday.to_string(), stats.holiday_days.to_string()],
            vec![text.tx.to_string(), stats.tx_days.to_string()],
        ];
        write_rows(&mut out, rows)?;
        Ok(())
    }

    #[tracing::instrument(skip(self, holidays))]
    pub fn print_holiday_table(&self, holidays: &[Holiday]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_holiday_table(&mut out, holidays)
    }

    pub fn write_holiday_table<W: Write>(&self, out: W, holidays: &[Holiday]) -> anyhow::Result<()> {
        let text = self.text();
        let palette = self.theme.palette();
        let headers = match self.language {
            Language::Zh => ["名称", "开始", "结束", text.tx],
            Language::En => ["Name", "Start", "End", text.tx],
        }
        .map(str::to_string)
        .to_vec();

        let rows = holidays
            .iter()
            .map(|holiday| {
                vec![
                    self.paint(&holiday.name, palette.holiday, true),
                    holiday.start_date.clone(),
                    holiday.end_date.clone(),
                    holiday.tx_date_list.join(" "),
                ]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn print_countdown(&self, countdown: &Countdown) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", self.countdown_line(countdown))?;
        Ok(())
    }

    pub fn countdown_line(&self, countdown: &Countdown) -> String {
        match (countdown, self.language) {
            (Countdown::Holiday { name, days, hours }, Language::Zh) => {
                format!("距离{name}还有 {days}天{hours}小时")
            }
            (Countdown::Holiday { name, days, hours }, Language::En) => {
                format!("{name} starts in {days}d {hours}h")
            }
            (Countdown::EndOfWorkday { hours, minutes }, Language::Zh) => {
                format!("{}，距离下班还有 {hours}小时{minutes}分钟", self.text().no_upcoming)
            }
            (Countdown::EndOfWorkday { hours, minutes }, Language::En) => {
                format!(
                    "{}; {hours}h {minutes}m until the end of the workday",
                    self.text().no_upcoming
                )
            }
        }
    }

    fn paint(&self, text: &str, rgb: Rgb, bold: bool) -> String {
        if !self.color {
            return text.to_string();
        }
        let (r, g, b) = rgb;
        let weight = if bold { "1;" } else { "" };
        format!("\x1b[{weight}38;2;{r};{g};{b}m{text}\x1b[0m")
    }

    fn paint_today(&self, text: &str, palette: Palette) -> String {
        if !self.color {
            return text.to_string();
        }
        let (r, g, b) = palette.today;
        let (fr, fg, fb) = palette.today_text;
        format!("\x1b[1;38;2;{fr};{fg};{fb};48;2;{r};{g};{b}m{text}\x1b[0m")
    }
}

fn marker(class: DayClass) -> &'static str {
    match class {
        DayClass::Today => "#",
        DayClass::Holiday => "*",
        DayClass::CompensatoryWorkday => "+",
        DayClass::Weekend | DayClass::Normal => " ",
    }
}

fn pad_left(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    format!("{}{text}", " ".repeat(width.saturating_sub(visible)))
}

fn center(text: &str, width: usize) -> String {
    let visible = UnicodeWidthStr::width(text);
    let left = width.saturating_sub(visible) / 2;
    format!("{}{text}", " ".repeat(left))
}

fn write_rows<W: Write>(mut writer: W, rows: Vec<Vec<String>>) -> anyhow::Result<()> {
    let label_width = rows
        .iter()
        .filter_map(|row| row.first())
        .map(|cell| UnicodeWidthStr::width(cell.as_str()))
        .max()
        .unwrap_or(0);

    for row in rows {
        let mut cells = row.into_iter();
        let label = cells.next().unwrap_or_default();
        let rest = cells.collect::<Vec<_>>().join(" ");
        let padding = label_width.saturating_sub(UnicodeWidthStr::width(label.as_str()));
        writeln!(writer, "  {label}{}  {rest}", " ".repeat(padding))?;
    }
    Ok(())
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
        let padding = widths[idx].saturating_sub(UnicodeWidthStr::width(headers[idx].as_str()));
        write!(writer, "{}{} ", headers[idx], " ".repeat(padding))?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
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

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{Renderer, Theme, strip_ansi};
    use crate::config::Config;
    use crate::grid::{CalendarRequest, build_grid};
    use crate::holiday::Holiday;
    use crate::i18n::Language;
    use crate::stats::Countdown;

    fn october_grid() -> crate::grid::MonthGrid {
        let holidays = [Holiday::new(
            "National Day",
            "2025-10-01",
            "2025-10-07",
            &["2025-09-28", "2025-10-11"],
        )];
        let request = CalendarRequest {
            year: 2025,
            month: 9,
            holidays: &holidays,
        };
        let today = NaiveDate::from_ymd_opt(2025, 10, 20).expect("date");
        build_grid(&request, today).expect("grid")
    }

    #[test]
    fn plain_month_marks_classes() {
        let mut buf = Vec::new();
        Renderer::plain(Language::En)
            .write_month(&mut buf, &october_grid())
            .expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0].trim(), "October 2025");
        assert_eq!(lines[1], "  Mo  Tu  We  Th  Fr  Sa  Su");
        // Two blanks, then holidays 1-5.
        assert_eq!(lines[2], "          1*  2*  3*  4*  5*");
        assert!(lines[3].contains("11+"));
        assert!(lines[5].contains("20#"));
        assert!(text.contains("* Holiday"));
    }

    #[test]
    fn chinese_header_aligns_wide_labels() {
        let mut buf = Vec::new();
        Renderer::plain(Language::Zh)
            .write_month(&mut buf, &october_grid())
            .expect("render");
        let text = String::from_utf8(buf).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0].trim(), "2025年 10月");
        assert_eq!(lines[1], "  一  二  三  四  五  六  日");
    }

    #[test]
    fn holiday_table_lists_tx_days() {
        let holidays = [Holiday::new(
            "Labour Day",
            "2025-05-01",
            "2025-05-05",
            &["2025-04-27"],
        )];
        let mut buf = Vec::new();
        Renderer::plain(Language::En)
            .write_holiday_table(&mut buf, &holidays)
            .expect("table");
        let text = String::from_utf8(buf).expect("utf8");
        assert!(text.starts_with("Name"));
        assert!(text.contains("Labour Day 2025-05-01 2025-05-05 2025-04-27"));
    }

    #[test]
    fn countdown_lines_per_language() {
        let countdown = Countdown::Holiday {
            name: "National Day".to_string(),
            days: 2,
            hours: 9,
        };
        assert_eq!(
            Renderer::plain(Language::En).countdown_line(&countdown),
            "National Day starts in 2d 9h"
        );
        assert_eq!(
            Renderer::plain(Language::Zh).countdown_line(&countdown),
            "距离National Day还有 2天9小时"
        );
    }

    #[test]
    fn color_setting_uses_config_booleans() {
        let with_color = |value: &str| {
            let mut cfg = Config::defaults();
            cfg.apply_overrides(vec![("color".to_string(), value.to_string())]);
            Renderer::new(&cfg, Language::En, Theme::Light)
        };

        assert!(with_color("always").expect("always").color);
        assert!(!with_color("off").expect("off").color);
        assert!(!with_color("0").expect("zero").color);
        let err = with_color("sometimes").expect_err("unknown value");
        assert!(format!("{err:#}").contains("invalid color setting"));
    }

    #[test]
    fn parses_theme_names() {
        assert_eq!("Dark".parse::<Theme>().expect("dark"), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn strips_escape_sequences() {
        assert_eq!(strip_ansi("\x1b[1;38;2;1;2;3mhi\x1b[0m"), "hi");
    }
}
