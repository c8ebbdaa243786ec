use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::Serialize;

use crate::grid::{DayClass, TitleParts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Zh,
    En,
}

impl Language {
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Zh => "zh",
            Self::En => "en",
        }
    }

    /// `2025年 10月` in Chinese, `October 2025` in English.
    pub fn title(self, parts: TitleParts) -> String {
        match self {
            Self::Zh => format!("{}年 {}月", parts.year, parts.month),
            Self::En => {
                let name = EN
                    .months
                    .get(parts.month.saturating_sub(1) as usize)
                    .copied()
                    .unwrap_or("?");
                format!("{name} {}", parts.year)
            }
        }
    }

    pub fn translation(self) -> &'static Translation {
        match self {
            Self::Zh => &ZH,
            Self::En => &EN,
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "cn" | "chinese" => Ok(Self::Zh),
            "en" | "en-us" | "english" => Ok(Self::En),
            other => Err(anyhow!("unsupported language: {other} (expected zh or en)")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

#[derive(Debug)]
pub struct Translation {
    pub holiday: &'static str,
    pub tx: &'static str,
    pub weekend: &'static str,
    pub today: &'static str,
    pub normal: &'static str,
    pub weekdays_short: [&'static str; 7],
    pub weekdays_long: [&'static str; 7],
    pub months: [&'static str; 12],
    pub stats_total: &'static str,
    pub stats_work: &'static str,
    pub no_upcoming: &'static str,
}

pub static ZH: Translation = Translation {
    holiday: "节假日",
    tx: "调休",
    weekend: "周末",
    today: "今天",
    normal: "工作日",
    weekdays_short: ["一", "二", "三", "四", "五", "六", "日"],
    weekdays_long: ["周一", "周二", "周三", "周四", "周五", "周六", "周日"],
    months: [
        "一月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "十一月",
        "十二月",
    ],
    stats_total: "总天数",
    stats_work: "工作日",
    no_upcoming: "暂无即将到来的节假日",
};

pub static EN: Translation = Translation {
    holiday: "Holiday",
    tx: "Workday",
    weekend: "Weekend",
    today: "Today",
    normal: "Normal",
    weekdays_short: ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
    weekdays_long: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
    months: [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ],
    stats_total: "Total days",
    stats_work: "Work days",
    no_upcoming: "No upcoming holidays",
};

impl Translation {
    pub fn class_label(&self, class: DayClass) -> &'static str {
        match class {
            DayClass::Today => self.today,
            DayClass::Holiday => self.holiday,
            DayClass::CompensatoryWorkday => self.tx,
            DayClass::Weekend => self.weekend,
            DayClass::Normal => self.normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Language;
    use crate::grid::{DayClass, TitleParts};

    #[test]
    fn titles_per_language() {
        let parts = TitleParts {
            year: 2025,
            month: 10,
        };
        assert_eq!(Language::Zh.title(parts), "2025年 10月");
        assert_eq!(Language::En.title(parts), "October 2025");
    }

    #[test]
    fn parses_language_codes() {
        assert_eq!("EN".parse::<Language>().expect("en"), Language::En);
        assert_eq!("zh-CN".parse::<Language>().expect("zh"), Language::Zh);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn labels_follow_classification() {
        let zh = Language::Zh.translation();
        assert_eq!(zh.class_label(DayClass::CompensatoryWorkday), "调休");
        assert_eq!(Language::En.translation().class_label(DayClass::Holiday), "Holiday");
    }
}
