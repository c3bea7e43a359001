use serde::Deserialize;
use serde_json::from_slice;
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::error::DataError;

const FB_DATA: &[u8] = include_bytes!("../data/all_fb.json");
const IG_DATA: &[u8] = include_bytes!("../data/all_ig.json");
const TW_DATA: &[u8] = include_bytes!("../data/all_tw.json");
const YT_DATA: &[u8] = include_bytes!("../data/all_yt.json");
const FREQ_DATA: &[u8] = include_bytes!("../data/freq_univ.json");

/// Najwyższa ranga w tabeli częstotliwości publikacji
pub const MAX_FREQUENCY: u8 = 5;

/// Serwisy, dla których mamy dane
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Platform {
    Facebook,
    Instagram,
    Twitter,
    YouTube,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::Twitter,
        Platform::YouTube,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Platform::Facebook  => "fb",
            Platform::Instagram => "ig",
            Platform::Twitter   => "tw",
            Platform::YouTube   => "yt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Platform::Facebook  => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::Twitter   => "Twitter",
            Platform::YouTube   => "YouTube",
        }
    }

    /// Kolor marki (RGB) używany jako baza koloru znacznika
    pub fn brand_rgb(self) -> (u8, u8, u8) {
        match self {
            Platform::Facebook  => (0, 60, 143),
            Platform::Instagram => (188, 24, 136),
            Platform::Twitter   => (29, 161, 242),
            Platform::YouTube   => (252, 1, 0),
        }
    }

    /// YouTube nie podaje częstotliwości publikacji, tylko wyświetlenia
    pub fn reports_frequency(self) -> bool {
        self != Platform::YouTube
    }

    /// Klucz "luźny": `None` dla nieznanego serwisu
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }
}

impl FromStr for Platform {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s.trim()).ok_or_else(|| DataError::UnknownPlatform(s.to_string()))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Surowa komórka zbioru danych. Kolumny bywają liczbami, napisami,
/// pustymi napisami albo w ogóle ich nie ma.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Field {
    #[default]
    #[serde(skip)]
    Missing,
    Number(f64),
    Text(String),
    Flag(bool),
    Null,
}

impl Field {
    /// Zamiana na liczbę. Pusty napis i `null` dają 0, brak kolumny
    /// lub napis nieliczbowy (także "inf", "NaN") dają `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Field::Missing => None,
            Field::Number(n) => Some(*n),
            Field::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Some(0.0)
                } else {
                    s.parse::<f64>().ok().filter(|n| n.is_finite())
                }
            }
            Field::Flag(b) => Some(if *b { 1.0 } else { 0.0 }),
            Field::Null => Some(0.0),
        }
    }

    /// Etykieta tekstowa (tylko dla napisów)
    pub fn as_label(&self) -> Option<&str> {
        match self {
            Field::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Missing | Field::Null => Ok(()),
            Field::Number(n) if n.fract() == 0.0 && n.is_finite() => write!(f, "{}", *n as i64),
            Field::Number(n) => write!(f, "{}", n),
            Field::Text(s) => f.write_str(s),
            Field::Flag(b) => write!(f, "{}", b),
        }
    }
}

/// Wiersz w postaci z pliku JSON
#[derive(Clone, Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "Prov.", default)]
    province_code: Field,
    #[serde(rename = "Comune", default)]
    municipality_code: Field,
    #[serde(rename = "Nome Comune", default)]
    name: Option<String>,
    #[serde(rename = "Latitudine", default)]
    latitude: Field,
    #[serde(rename = "Longitudine", default)]
    longitude: Field,
    #[serde(rename = "Residenti", default)]
    residents: Field,
    #[serde(rename = "Followers", default)]
    followers: Field,
    #[serde(rename = "Likes", default)]
    likes: Field,
    #[serde(rename = "Frequenza", default)]
    frequency: Field,
    #[serde(rename = "Numero di views totali", default)]
    total_views: Field,
}

/// Zasięg profilu: obserwujący albo polubienia (zależnie od serwisu)
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Audience {
    pub followers: Field,
    pub likes: Field,
}

/// Drugi składnik wskaźnika, zależny od serwisu
#[derive(Clone, Debug, PartialEq)]
pub enum Activity {
    /// Facebook, Instagram, Twitter: deklarowana częstotliwość publikacji
    Posting { frequency: Field },
    /// YouTube: łączna liczba wyświetleń
    Video { total_views: Field },
}

/// Jeden wiersz zbioru: gmina i jej profil w danym serwisie
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub province_code: Field,
    pub municipality_code: Field,
    pub name: String,
    pub latitude: Field,
    pub longitude: Field,
    pub residents: Field,
    pub audience: Audience,
    pub activity: Activity,
}

impl Record {
    fn from_raw(raw: RawRecord, platform: Platform) -> Self {
        let activity = if platform.reports_frequency() {
            Activity::Posting { frequency: raw.frequency }
        } else {
            Activity::Video { total_views: raw.total_views }
        };
        Self {
            province_code: raw.province_code,
            municipality_code: raw.municipality_code,
            name: raw.name.unwrap_or_default(),
            latitude: raw.latitude,
            longitude: raw.longitude,
            residents: raw.residents,
            audience: Audience { followers: raw.followers, likes: raw.likes },
            activity,
        }
    }

    /// Identyfikator złożony: `<prowincja>-<gmina>`
    pub fn id(&self) -> String {
        format!("{}-{}", self.province_code, self.municipality_code)
    }
}

/// Zbiór danych jednego serwisu
#[derive(Clone, Debug)]
pub struct Dataset {
    pub platform: Platform,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn parse(platform: Platform, bytes: &[u8]) -> Result<Self, DataError> {
        let raw: Vec<RawRecord> = from_slice(bytes).map_err(|source| DataError::Dataset {
            name: platform.key(),
            source,
        })?;
        let records = raw.into_iter().map(|r| Record::from_raw(r, platform)).collect();
        Ok(Self { platform, records })
    }
}

/// Etykieta częstotliwości → ranga 0..=5
#[derive(Clone, Debug, Default)]
pub struct FrequencyTable {
    ranks: BTreeMap<String, u8>,
}

impl FrequencyTable {
    pub fn normalize(label: &str) -> String {
        label.trim().to_lowercase()
    }

    pub fn parse(bytes: &[u8]) -> Result<Self, DataError> {
        let raw: BTreeMap<String, u8> = from_slice(bytes).map_err(DataError::FrequencyTable)?;
        Self::from_ranks(raw)
    }

    pub fn from_ranks<I, S>(ranks: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = (S, u8)>,
        S: AsRef<str>,
    {
        let mut table = BTreeMap::new();
        for (label, rank) in ranks {
            if rank > MAX_FREQUENCY {
                return Err(DataError::RankOutOfRange {
                    label: label.as_ref().to_string(),
                    rank,
                    max: MAX_FREQUENCY,
                });
            }
            table.insert(Self::normalize(label.as_ref()), rank);
        }
        Ok(Self { ranks: table })
    }

    /// Ranga etykiety; nieznana lub pusta etykieta ma rangę 0
    pub fn rank(&self, label: &str) -> u8 {
        self.ranks.get(&Self::normalize(label)).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }
}

/// Wszystkie wbudowane dane: cztery zbiory i tabela częstotliwości
pub struct Datasets {
    sets: BTreeMap<Platform, Dataset>,
    pub frequencies: FrequencyTable,
}

impl Datasets {
    pub fn load() -> Result<Self, DataError> {
        let mut sets = BTreeMap::new();
        for (platform, bytes) in [
            (Platform::Facebook, FB_DATA),
            (Platform::Instagram, IG_DATA),
            (Platform::Twitter, TW_DATA),
            (Platform::YouTube, YT_DATA),
        ] {
            let set = Dataset::parse(platform, bytes)?;
            log::debug!("wczytano {} wierszy dla {}", set.records.len(), platform);
            sets.insert(platform, set);
        }
        let frequencies = FrequencyTable::parse(FREQ_DATA)?;
        log::debug!("tabela częstotliwości: {} etykiet", frequencies.len());
        Ok(Self { sets, frequencies })
    }

    pub fn select(&self, platform: Platform) -> &Dataset {
        // load() wypełnia wszystkie cztery serwisy
        &self.sets[&platform]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Field::Number(12.5), Some(12.5))]
    #[case(Field::Text(" 1200 ".into()), Some(1200.0))]
    #[case(Field::Text(String::new()), Some(0.0))]
    #[case(Field::Text("n.d.".into()), None)]
    #[case(Field::Text("NaN".into()), None)]
    #[case(Field::Text("inf".into()), None)]
    #[case(Field::Text("-Infinity".into()), None)]
    #[case(Field::Null, Some(0.0))]
    #[case(Field::Missing, None)]
    #[case(Field::Flag(true), Some(1.0))]
    fn coerces_fields(#[case] field: Field, #[case] expected: Option<f64>) {
        assert_eq!(field.as_number(), expected);
    }

    #[rstest]
    #[case("fb", Some(Platform::Facebook))]
    #[case("yt", Some(Platform::YouTube))]
    #[case("tiktok", None)]
    fn resolves_platform_keys(#[case] key: &str, #[case] expected: Option<Platform>) {
        assert_eq!(Platform::from_key(key), expected);
        assert_eq!(key.parse::<Platform>().ok(), expected);
    }

    #[rstest]
    fn parses_messy_rows() {
        let json = br#"[
            {"Prov.": 82, "Comune": 53, "Nome Comune": "Palermo", "Residenti": "630828",
             "Likes": 1000, "Frequenza": " Quotidiana "},
            {"Prov.": "083", "Comune": 48, "Residenti": null, "Followers": ""}
        ]"#;
        let set = Dataset::parse(Platform::Facebook, json).expect("dataset");

        assert_eq!(set.records.len(), 2);
        let first = &set.records[0];
        assert_eq!(first.id(), "82-53");
        assert_eq!(first.residents.as_number(), Some(630828.0));
        assert_eq!(first.audience.followers, Field::Missing);
        assert_eq!(
            first.activity,
            Activity::Posting { frequency: Field::Text(" Quotidiana ".into()) }
        );
        let second = &set.records[1];
        assert_eq!(second.id(), "083-48");
        assert_eq!(second.name, "");
        assert_eq!(second.residents, Field::Null);
        assert_eq!(second.audience.followers, Field::Text(String::new()));
    }

    #[rstest]
    fn video_rows_carry_views() {
        let json = br#"[{"Nome Comune": "Noto", "Residenti": 100, "Numero di views totali": 50,
                         "Frequenza": "quotidiana"}]"#;
        let set = Dataset::parse(Platform::YouTube, json).expect("dataset");

        assert_eq!(
            set.records[0].activity,
            Activity::Video { total_views: Field::Number(50.0) }
        );
    }

    #[rstest]
    fn frequency_table_normalizes_labels() {
        let table = FrequencyTable::from_ranks([(" Settimanale", 2), ("QUOTIDIANA", 4)])
            .expect("table");

        assert_eq!(table.rank("settimanale "), 2);
        assert_eq!(table.rank("Quotidiana"), 4);
        assert_eq!(table.rank(""), 0);
        assert_eq!(table.rank("ogni tanto"), 0);
    }

    #[rstest]
    fn frequency_table_rejects_ranks_above_max() {
        let err = FrequencyTable::from_ranks([("sempre", 9)]).unwrap_err();

        assert!(matches!(err, DataError::RankOutOfRange { rank: 9, .. }));
    }

    #[rstest]
    fn bundled_data_loads() {
        let data = Datasets::load().expect("bundled data");

        for platform in Platform::ALL {
            let set = data.select(platform);
            assert_eq!(set.platform, platform);
            assert!(!set.records.is_empty());
        }
        assert_eq!(data.frequencies.rank("più volte al giorno"), MAX_FREQUENCY);
    }
}
