use clap::Parser;
use std::path::PathBuf;

use crate::data::Platform;
use crate::layer::ProvinceFilter;

/// Mapa zaangażowania gmin Sycylii w mediach społecznościowych
#[derive(Debug, Parser)]
#[command(name = "sicily-atlas", version, about)]
pub struct Args {
    /// Serwis pokazywany na starcie: fb, ig, tw, yt
    #[arg(short, long, default_value = "fb")]
    pub social: Platform,

    /// Pokaż tylko stolice prowincji
    #[arg(short = 'p', long)]
    pub only_prov: bool,

    /// Zapisuj log do pliku (poziom przez RUST_LOG)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn view(&self) -> ViewConfig {
        ViewConfig {
            platform: self.social,
            filter: ProvinceFilter::from_flag(self.only_prov),
        }
    }
}

/// Jedyny stan wpływający na warstwę: serwis i filtr prowincji
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewConfig {
    pub platform: Platform,
    pub filter: ProvinceFilter,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { platform: Platform::Facebook, filter: ProvinceFilter::All }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_to_facebook_and_all_municipalities() {
        let args = Args::try_parse_from(["sicily-atlas"]).expect("args");

        assert_eq!(args.view(), ViewConfig::default());
        assert!(args.log_file.is_none());
    }

    #[rstest]
    fn parses_platform_and_filter() {
        let args = Args::try_parse_from(["sicily-atlas", "--social", "yt", "-p"]).expect("args");

        assert_eq!(
            args.view(),
            ViewConfig { platform: Platform::YouTube, filter: ProvinceFilter::ProvincesOnly }
        );
    }

    #[rstest]
    fn rejects_unknown_platform() {
        assert!(Args::try_parse_from(["sicily-atlas", "--social", "tiktok"]).is_err());
    }
}
