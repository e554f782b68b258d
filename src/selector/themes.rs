//! Fallback theme rotation for daily comparisons

use chrono::NaiveDate;

/// Ordered theme list cycled by day-of-year when no schedule entry exists
pub const FALLBACK_THEMES: [&str; 12] = [
    "Innovation Leaders",
    "User Experience Champions",
    "Market Disruptors",
    "Tech Giants",
    "Cloud Computing Leaders",
    "AI Pioneers",
    "Hardware Innovators",
    "Software Powerhouses",
    "Consumer Tech Favorites",
    "Enterprise Solutions",
    "Social Media Titans",
    "E-commerce Leaders",
];

/// Theme for a date: day-of-year against the fixed list, cycling on overflow
pub fn theme_for(date: NaiveDate) -> String {
    let index = super::day_of_year(date) % FALLBACK_THEMES.len();
    FALLBACK_THEMES[index].to_string()
}
