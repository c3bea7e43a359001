use thiserror::Error;

/// Błędy ładowania wbudowanych zbiorów danych
#[derive(Debug, Error)]
pub enum DataError {
    #[error("nieznany serwis społecznościowy `{0}` (dozwolone: fb, ig, tw, yt)")]
    UnknownPlatform(String),

    #[error("nie udało się wczytać zbioru danych {name}")]
    Dataset {
        name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("nie udało się wczytać tabeli częstotliwości")]
    FrequencyTable(#[source] serde_json::Error),

    #[error("etykieta `{label}` ma rangę {rank}, większą niż maksimum {max}")]
    RankOutOfRange { label: String, rank: u8, max: u8 },
}

/// Błędy przygotowania geometrii mapy
#[derive(Debug, Error)]
pub enum MapError {
    #[error("nie udało się wczytać geodanych")]
    GeoJson(#[from] geojson::Error),

    #[error("geodane muszą być kolekcją obiektów (FeatureCollection)")]
    NotACollection,

    #[error("geodane nie zawierają żadnych wielokątów")]
    Empty,
}
