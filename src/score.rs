use ratatui::style::Color;
use std::fmt;

use crate::data::{Activity, FrequencyTable, MAX_FREQUENCY, Platform, Record};

/// Wskaźnik zaangażowania:
/// V = (zasięg / mieszkańcy + aktywność) / 2,
/// gdzie aktywność to ranga częstotliwości / 5 albo wyświetlenia / mieszkańcy.
pub struct EngagementScorer<'a> {
    frequencies: &'a FrequencyTable,
}

impl<'a> EngagementScorer<'a> {
    pub fn new(frequencies: &'a FrequencyTable) -> Self {
        Self { frequencies }
    }

    /// `None` oznacza brak danych (np. zero mieszkańców albo pola nieliczbowe)
    pub fn score(&self, record: &Record) -> Option<f64> {
        let residents = record.residents.as_number();
        let per_capita = |count: Option<f64>| Some(count? / residents?);

        let reach = match record.audience.followers.as_number() {
            Some(followers) => per_capita(Some(followers)),
            None => per_capita(record.audience.likes.as_number()),
        };

        let value = match &record.activity {
            Activity::Posting { frequency } => {
                let rank = frequency.as_label().map_or(0, |l| self.frequencies.rank(l));
                let activity = f64::from(rank) / f64::from(MAX_FREQUENCY);
                (reach? + activity) / 2.0
            }
            Activity::Video { total_views } => {
                let views = per_capita(total_views.as_number())?;
                (reach.filter(|r| !r.is_nan()).unwrap_or(0.0) + views) / 2.0
            }
        };

        value.is_finite().then_some(value)
    }
}

/// Kolor znacznika w notacji CSS
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MapColor {
    /// Brak danych: biały
    NoData,
    /// Nieznany serwis: biały, nieprzezroczysty
    Unknown,
    /// Kolor marki z przezroczystością = wskaźnik + 0.2 (bez obcinania do 1)
    Brand { rgb: (u8, u8, u8), alpha: f64 },
}

impl MapColor {
    pub const ALPHA_OFFSET: f64 = 0.2;

    pub fn for_score(score: Option<f64>, platform: Option<Platform>) -> Self {
        let Some(score) = score.filter(|s| !s.is_nan()) else {
            return MapColor::NoData;
        };
        match platform {
            Some(p) => MapColor::Brand { rgb: p.brand_rgb(), alpha: score + Self::ALPHA_OFFSET },
            None => MapColor::Unknown,
        }
    }

    /// Kolor dla terminala: złożenie na białym tle, alfa obcięta do [0, 1]
    pub fn to_terminal(self) -> Color {
        match self {
            MapColor::NoData | MapColor::Unknown => Color::Rgb(255, 255, 255),
            MapColor::Brand { rgb: (r, g, b), alpha } => {
                let a = alpha.clamp(0.0, 1.0);
                let mix = |c: u8| (f64::from(c) * a + 255.0 * (1.0 - a)).round() as u8;
                Color::Rgb(mix(r), mix(g), mix(b))
            }
        }
    }
}

impl fmt::Display for MapColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapColor::NoData => f.write_str("rgb(255, 255, 255)"),
            MapColor::Unknown => f.write_str("rgba(255, 255, 255, 1)"),
            MapColor::Brand { rgb: (r, g, b), alpha } => {
                write!(f, "rgba({}, {}, {}, {})", r, g, b, alpha)
            }
        }
    }
}
