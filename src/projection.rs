use geo::{Coord, MapCoords, MultiPolygon};
use std::f64::consts::FRAC_PI_4;

/// Odwzorowanie walcowe Millera (długość, szerokość w stopniach → x, y)
pub fn miller(lon: f64, lat: f64) -> Coord<f64> {
    let lambda = lon.to_radians();
    let phi = lat.to_radians();
    Coord {
        x: lambda,
        y: 1.25 * (FRAC_PI_4 + 0.4 * phi).tan().ln(),
    }
}

/// Odwrotność `miller`, przydatna do pokazania współrzędnych kursora
pub fn miller_inverse(c: Coord<f64>) -> (f64, f64) {
    let lat = 2.5 * ((0.8 * c.y).exp().atan() - FRAC_PI_4);
    (c.x.to_degrees(), lat.to_degrees())
}

pub fn project(mp: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    mp.map_coords(|c| miller(c.x, c.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn equator_maps_to_zero() {
        let c = miller(0.0, 0.0);
        assert!(c.x.abs() < 1e-12);
        assert!(c.y.abs() < 1e-12);
    }

    #[rstest]
    #[case(13.3615, 38.1157)]
    #[case(15.0830, 37.5079)]
    #[case(11.97, 36.78)]
    fn inverse_round_trips(#[case] lon: f64, #[case] lat: f64) {
        let (lon2, lat2) = miller_inverse(miller(lon, lat));
        assert!((lon - lon2).abs() < 1e-9);
        assert!((lat - lat2).abs() < 1e-9);
    }

    #[rstest]
    fn north_is_up() {
        assert!(miller(14.0, 38.2).y > miller(14.0, 36.7).y);
    }
}
