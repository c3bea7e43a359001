//! Zamiana wierszy zbioru na znaczniki mapy.

use crate::config::ViewConfig;
use crate::data::{Dataset, Platform, Record};
use crate::score::{EngagementScorer, MapColor};

/// Stolice prowincji Sycylii
pub const PROVINCES: [&str; 9] = [
    "Catania",
    "Agrigento",
    "Trapani",
    "Enna",
    "Ragusa",
    "Caltanissetta",
    "Siracusa",
    "Palermo",
    "Messina",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProvinceFilter {
    #[default]
    All,
    ProvincesOnly,
}

impl ProvinceFilter {
    pub fn from_flag(only_provinces: bool) -> Self {
        if only_provinces { ProvinceFilter::ProvincesOnly } else { ProvinceFilter::All }
    }

    pub fn toggled(self) -> Self {
        match self {
            ProvinceFilter::All => ProvinceFilter::ProvincesOnly,
            ProvinceFilter::ProvincesOnly => ProvinceFilter::All,
        }
    }

    pub fn admits(self, record: &Record) -> bool {
        match self {
            ProvinceFilter::All => true,
            ProvinceFilter::ProvincesOnly => PROVINCES.contains(&record.name.as_str()),
        }
    }
}

/// Promień znacznika liniowo od `min` do `max` względem liczby mieszkańców
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeatRule {
    pub min: f64,
    pub max: f64,
}

impl Default for HeatRule {
    fn default() -> Self {
        Self { min: 5.0, max: 40.0 }
    }
}

impl HeatRule {
    pub fn radius(&self, value: Option<f64>, range: Option<(f64, f64)>) -> f64 {
        match (value, range) {
            (Some(v), Some((lo, hi))) if hi > lo => {
                self.min + (v - lo) / (hi - lo) * (self.max - self.min)
            }
            _ => self.min,
        }
    }
}

/// Jeden znacznik: gmina z wyliczonym wskaźnikiem i kolorem
#[derive(Clone, Debug, PartialEq)]
pub struct MapPoint {
    pub id: String,
    pub name: String,
    pub value: Option<f64>,
    pub score: Option<f64>,
    pub color: MapColor,
    pub radius: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl MapPoint {
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.longitude?, self.latitude?))
    }
}

/// Podsumowanie warstwy do panelu statystyk
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayerStats {
    pub points: usize,
    pub with_data: usize,
    pub mean_score: Option<f64>,
    pub best: Option<(String, f64)>,
    pub residents: f64,
}

/// Cała warstwa znaczników dla wybranego serwisu i filtra
#[derive(Clone, Debug)]
pub struct MapLayer {
    pub platform: Platform,
    pub filter: ProvinceFilter,
    pub points: Vec<MapPoint>,
}

impl MapLayer {
    pub fn build(dataset: &Dataset, scorer: &EngagementScorer<'_>, view: ViewConfig) -> Self {
        Self::build_with(dataset, scorer, view, HeatRule::default())
    }

    pub fn build_with(
        dataset: &Dataset,
        scorer: &EngagementScorer<'_>,
        view: ViewConfig,
        heat: HeatRule,
    ) -> Self {
        let mut points: Vec<MapPoint> = dataset
            .records
            .iter()
            .filter(|r| view.filter.admits(r))
            .map(|r| {
                let score = scorer.score(r);
                MapPoint {
                    id: r.id(),
                    name: r.name.clone(),
                    value: r.residents.as_number(),
                    score,
                    color: MapColor::for_score(score, Some(view.platform)),
                    radius: heat.min,
                    latitude: r.latitude.as_number(),
                    longitude: r.longitude.as_number(),
                }
            })
            .collect();

        let range = points.iter().filter_map(|p| p.value).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((f64::min(lo, v), f64::max(hi, v))),
        });
        for p in &mut points {
            p.radius = heat.radius(p.value, range);
        }

        let layer = Self { platform: view.platform, filter: view.filter, points };
        let stats = layer.stats();
        log::info!(
            "warstwa {}: {} gmin, {} z danymi",
            dataset.platform,
            stats.points,
            stats.with_data
        );
        layer
    }

    pub fn stats(&self) -> LayerStats {
        let scored: Vec<(&MapPoint, f64)> =
            self.points.iter().filter_map(|p| Some((p, p.score?))).collect();
        let mean_score = (!scored.is_empty())
            .then(|| scored.iter().map(|(_, s)| s).sum::<f64>() / scored.len() as f64);
        let best = scored
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(p, s)| (p.name.clone(), *s));

        LayerStats {
            points: self.points.len(),
            with_data: scored.len(),
            mean_score,
            best,
            residents: self.points.iter().filter_map(|p| p.value).sum(),
        }
    }
}
