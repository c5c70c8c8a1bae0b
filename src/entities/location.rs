use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{invalid_input_error, Error};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinates {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    pub fn validate(self) -> Result<Self, Error> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(invalid_input_error())
        }
    }
}

// "lat,lng", the form the maps web services take
impl From<Coordinates> for String {
    fn from(coordinates: Coordinates) -> Self {
        format!("{},{}", coordinates.latitude, coordinates.longitude)
    }
}

/// A geocoded pin. The label is the address as the user typed it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub id: Uuid,
    pub label: String,
    pub coordinates: Coordinates,
}

impl Waypoint {
    pub fn new(label: String, coordinates: Coordinates) -> Self {
        Waypoint {
            id: Uuid::new_v4(),
            label,
            coordinates,
        }
    }
}

/// A geocoding match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub coordinates: Coordinates,
    pub formatted_address: String,
}

/// Smallest rectangle containing a set of coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: Coordinates,
    pub north_east: Coordinates,
}

impl Bounds {
    pub fn enclosing<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinates>,
    {
        let mut points = points.into_iter();
        let first = *points.next()?;

        let bounds = points.fold(
            Bounds {
                south_west: first,
                north_east: first,
            },
            |mut b, p| {
                b.south_west.latitude = b.south_west.latitude.min(p.latitude);
                b.south_west.longitude = b.south_west.longitude.min(p.longitude);
                b.north_east.latitude = b.north_east.latitude.max(p.latitude);
                b.north_east.longitude = b.north_east.longitude.max(p.longitude);
                b
            },
        );

        Some(bounds)
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(
            (self.south_west.latitude + self.north_east.latitude) / 2.0,
            (self.south_west.longitude + self.north_east.longitude) / 2.0,
        )
    }
}

#[test]
fn coordinates_validation() {
    assert!(Coordinates::new(53.9, 27.56).is_valid());
    assert!(Coordinates::new(-90.0, 180.0).is_valid());
    assert!(!Coordinates::new(90.5, 0.0).is_valid());
    assert!(!Coordinates::new(0.0, -180.1).is_valid());
    assert!(!Coordinates::new(f64::NAN, 0.0).is_valid());
    assert_eq!(
        Coordinates::new(91.0, 0.0).validate().unwrap_err().code,
        101
    );
}

#[test]
fn coordinates_query_string() {
    let s: String = Coordinates::new(53.9, 27.5).into();
    assert_eq!(s, "53.9,27.5");
}

#[test]
fn bounds_enclose_all_points() {
    let points = vec![
        Coordinates::new(53.90, 27.56),
        Coordinates::new(53.85, 27.60),
        Coordinates::new(53.95, 27.50),
    ];

    let bounds = Bounds::enclosing(&points).unwrap();
    assert_eq!(bounds.south_west, Coordinates::new(53.85, 27.50));
    assert_eq!(bounds.north_east, Coordinates::new(53.95, 27.60));

    let center = bounds.center();
    assert!((center.latitude - 53.90).abs() < 1e-9);
    assert!((center.longitude - 27.55).abs() < 1e-9);

    assert!(Bounds::enclosing(&Vec::<Coordinates>::new()).is_none());
}
