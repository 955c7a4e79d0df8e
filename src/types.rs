//! Core data types used throughout the sink

use std::fmt;

use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// A single film record as posted to the sink
///
/// Decoding follows plain JSON object mapping rules: keys match field names
/// case-insensitively, a repeated key keeps its last value, missing or
/// `null` fields stay at their zero value and unknown keys are ignored.
/// Anything other than an object (or a bare `null`) is a decode error, as is
/// a value of the wrong type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Film {
    /// Release year
    pub year: i64,
    /// Running length, not validated
    pub length: f64,
    pub title: String,
    pub subject: String,
    pub actor: String,
    pub actress: String,
    pub director: String,
    /// Popularity on a 0-100 scale
    pub popularity: f64,
    /// `""`, `"Yes"` or `"No"`
    pub awards: String,
    /// Poster file name
    pub image: String,
}

impl Film {
    /// Decode a film from a raw request body.
    ///
    /// Invalid UTF-8 sequences are replaced with U+FFFD before parsing so
    /// that they are reported by field validation, with their offset,
    /// instead of failing the whole payload.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        let text = String::from_utf8_lossy(body);
        serde_json::from_str(&text)
    }

    /// Text fields in the order their well-formedness is checked
    pub fn text_fields(&self) -> [(&'static str, &str); 7] {
        [
            ("title", self.title.as_str()),
            ("subject", self.subject.as_str()),
            ("actor", self.actor.as_str()),
            ("actress", self.actress.as_str()),
            ("director", self.director.as_str()),
            ("awards", self.awards.as_str()),
            ("image", self.image.as_str()),
        ]
    }
}

impl<'de> Deserialize<'de> for Film {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(FilmVisitor)
    }
}

struct FilmVisitor;

impl<'de> Visitor<'de> for FilmVisitor {
    type Value = Film;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON object describing a film")
    }

    // a bare `null` leaves every field at its zero value
    fn visit_unit<E>(self) -> Result<Film, E>
    where
        E: serde::de::Error,
    {
        Ok(Film::default())
    }

    fn visit_map<A>(self, mut map: A) -> Result<Film, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut film = Film::default();
        while let Some(key) = map.next_key::<String>()? {
            match key.to_lowercase().as_str() {
                "year" => assign(&mut map, &mut film.year)?,
                "length" => assign(&mut map, &mut film.length)?,
                "title" => assign(&mut map, &mut film.title)?,
                "subject" => assign(&mut map, &mut film.subject)?,
                "actor" => assign(&mut map, &mut film.actor)?,
                "actress" => assign(&mut map, &mut film.actress)?,
                "director" => assign(&mut map, &mut film.director)?,
                "popularity" => assign(&mut map, &mut film.popularity)?,
                "awards" => assign(&mut map, &mut film.awards)?,
                "image" => assign(&mut map, &mut film.image)?,
                _ => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }
        Ok(film)
    }
}

/// Overwrite `slot` with the next value; `null` leaves it untouched
fn assign<'de, A, T>(map: &mut A, slot: &mut T) -> Result<(), A::Error>
where
    A: MapAccess<'de>,
    T: Deserialize<'de>,
{
    if let Some(value) = map.next_value::<Option<T>>()? {
        *slot = value;
    }
    Ok(())
}

/// Request kinds that own an outcome counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// Read-style listing request
    Get,
    /// Film submission
    Post,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_film() {
        let body = br#"{
            "year": 1999, "length": 136.5, "title": "The Matrix",
            "subject": "Action", "actor": "Keanu Reeves", "actress": "Carrie-Anne Moss",
            "director": "Wachowski", "popularity": 87, "awards": "Yes", "image": "matrix.jpg"
        }"#;
        let film = Film::from_slice(body).unwrap();
        assert_eq!(film.year, 1999);
        assert_eq!(film.length, 136.5);
        assert_eq!(film.title, "The Matrix");
        assert_eq!(film.popularity, 87.0);
        assert_eq!(film.image, "matrix.jpg");
    }

    #[test]
    fn test_missing_and_null_fields_default() {
        let film = Film::from_slice(br#"{"title": "Solaris", "actor": null}"#).unwrap();
        assert_eq!(film.title, "Solaris");
        assert_eq!(film.actor, "");
        assert_eq!(film.year, 0);
        assert_eq!(film.popularity, 0.0);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let film = Film::from_slice(br#"{"title": "Alien", "rating": "R"}"#).unwrap();
        assert_eq!(film.title, "Alien");
    }

    #[test]
    fn test_type_mismatch_is_decode_error() {
        assert!(Film::from_slice(br#"{"year": "1999"}"#).is_err());
        assert!(Film::from_slice(br#"{"year": 1999.5}"#).is_err());
        assert!(Film::from_slice(br#"{"title": 12}"#).is_err());
    }

    #[test]
    fn test_malformed_payloads() {
        assert!(Film::from_slice(b"").is_err());
        assert!(Film::from_slice(b"{\"title\":").is_err());
        assert!(Film::from_slice(b"\"Alien\"").is_err());
        assert!(Film::from_slice(b"42").is_err());
    }

    #[test]
    fn test_array_payload_rejected() {
        let body = br#"[1979, 117, "Alien", "", "", "", "", 90, "Yes", "alien.png"]"#;
        let err = Film::from_slice(body).unwrap_err();
        assert!(err.to_string().contains("JSON object"));
        assert!(Film::from_slice(b"[]").is_err());
    }

    #[test]
    fn test_bare_null_is_empty_film() {
        assert_eq!(Film::from_slice(b"null").unwrap(), Film::default());
    }

    #[test]
    fn test_keys_match_case_insensitively() {
        let film =
            Film::from_slice(br#"{"Title": "Alien", "YEAR": 1979, "Popularity": 90}"#).unwrap();
        assert_eq!(film.title, "Alien");
        assert_eq!(film.year, 1979);
        assert_eq!(film.popularity, 90.0);
    }

    #[test]
    fn test_repeated_key_keeps_last_value() {
        let film = Film::from_slice(br#"{"title": "A", "title": "Alien", "year": 1979}"#).unwrap();
        assert_eq!(film.title, "Alien");

        let film = Film::from_slice(br#"{"title": "Alien", "Title": "Aliens"}"#).unwrap();
        assert_eq!(film.title, "Aliens");

        // null does not undo an earlier value
        let film = Film::from_slice(br#"{"year": 1986, "year": null}"#).unwrap();
        assert_eq!(film.year, 1986);
    }

    #[test]
    fn test_invalid_utf8_becomes_replacement_char() {
        let mut body = br#"{"title": "ab"#.to_vec();
        body.push(0xff);
        body.extend_from_slice(br#"c"}"#);
        let film = Film::from_slice(&body).unwrap();
        assert_eq!(film.title, "ab\u{FFFD}c");
    }

    #[test]
    fn test_text_field_order() {
        let names: Vec<_> = Film::default()
            .text_fields()
            .iter()
            .map(|(name, _)| *name)
            .collect();
        assert_eq!(
            names,
            ["title", "subject", "actor", "actress", "director", "awards", "image"]
        );
    }
}
