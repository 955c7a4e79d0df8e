//! Film record validation
//!
//! Rules are checked in a fixed order and the first violation wins, so a
//! given record always yields the same diagnostic:
//!
//! 1. title present
//! 2. year within `[1888, current year]`
//! 3. popularity within `[0, 100]`
//! 4. awards is `""`, `"Yes"` or `"No"`
//! 5. image, when set, ends in `.png`, `.jpg` or `.jpeg`
//! 6. no replacement characters in title, subject, actor, actress,
//!    director, awards, image

use chrono::{Datelike, Local};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::types::Film;

/// Year of the first surviving motion picture
pub const FIRST_FILM_YEAR: i64 = 1888;

/// Accepted poster file names
pub const IMAGE_PATTERN: &str = r".+\.(png|jpg|jpeg)$";

static IMAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(IMAGE_PATTERN).unwrap());

/// Validate a film against the current calendar year
pub fn validate(film: &Film) -> Result<(), ValidationError> {
    validate_at(film, i64::from(Local::now().year()))
}

/// Validate a film with an explicit upper bound for `year`
pub fn validate_at(film: &Film, current_year: i64) -> Result<(), ValidationError> {
    if film.title.is_empty() {
        return Err(ValidationError::MissingTitle);
    }
    if film.year < FIRST_FILM_YEAR || film.year > current_year {
        return Err(ValidationError::YearOutOfRange {
            year: film.year,
            min: FIRST_FILM_YEAR,
            max: current_year,
        });
    }
    if !(0.0..=100.0).contains(&film.popularity) {
        return Err(ValidationError::PopularityOutOfRange(film.popularity));
    }
    match film.awards.as_str() {
        "" | "Yes" | "No" => {}
        other => return Err(ValidationError::InvalidAwards(other.to_string())),
    }
    if !film.image.is_empty() && !IMAGE_RE.is_match(&film.image) {
        return Err(ValidationError::ImagePattern {
            pattern: IMAGE_PATTERN,
            value: film.image.clone(),
        });
    }
    for (field, value) in film.text_fields() {
        check_text(field, value)?;
    }
    Ok(())
}

/// Reject text carrying U+FFFD, reporting the byte offset of the first one
fn check_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    match value.find(char::REPLACEMENT_CHARACTER) {
        Some(offset) => Err(ValidationError::InvalidCharacter {
            field,
            offset,
            value: value.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YEAR: i64 = 2024;

    fn valid_film() -> Film {
        Film {
            year: 1999,
            length: 136.0,
            title: "The Matrix".into(),
            subject: "Action".into(),
            actor: "Keanu Reeves".into(),
            actress: "Carrie-Anne Moss".into(),
            director: "Wachowski".into(),
            popularity: 87.0,
            awards: "Yes".into(),
            image: "matrix.png".into(),
        }
    }

    #[test]
    fn test_valid_film_passes() {
        assert_eq!(validate_at(&valid_film(), YEAR), Ok(()));
    }

    #[test]
    fn test_validate_uses_current_year() {
        let mut film = valid_film();
        film.year = i64::from(Local::now().year());
        assert!(validate(&film).is_ok());
        film.year += 1;
        assert!(matches!(
            validate(&film),
            Err(ValidationError::YearOutOfRange { .. })
        ));
    }

    #[test]
    fn test_empty_title_wins_over_everything() {
        let film = Film {
            title: String::new(),
            year: 1,
            popularity: -5.0,
            awards: "Maybe".into(),
            image: "x.gif".into(),
            ..valid_film()
        };
        assert_eq!(validate_at(&film, YEAR), Err(ValidationError::MissingTitle));
        assert_eq!(
            validate_at(&Film::default(), YEAR),
            Err(ValidationError::MissingTitle)
        );
    }

    #[test]
    fn test_year_bounds() {
        for year in [FIRST_FILM_YEAR, YEAR] {
            let film = Film { year, ..valid_film() };
            assert!(validate_at(&film, YEAR).is_ok(), "year {year}");
        }
        for year in [0, 1700, FIRST_FILM_YEAR - 1, YEAR + 1, i64::MAX] {
            let film = Film { year, ..valid_film() };
            assert_eq!(
                validate_at(&film, YEAR),
                Err(ValidationError::YearOutOfRange {
                    year,
                    min: FIRST_FILM_YEAR,
                    max: YEAR
                })
            );
        }
    }

    #[test]
    fn test_popularity_bounds() {
        for popularity in [0.0, 50.5, 100.0] {
            let film = Film { popularity, ..valid_film() };
            assert!(validate_at(&film, YEAR).is_ok());
        }
        for popularity in [-0.1, 100.01, -100.0, 1e9] {
            let film = Film { popularity, ..valid_film() };
            let err = validate_at(&film, YEAR).unwrap_err();
            assert_eq!(err, ValidationError::PopularityOutOfRange(popularity));
            assert!(err.to_string().starts_with("popularity must be"));
        }
    }

    #[test]
    fn test_awards_enum() {
        for awards in ["", "Yes", "No"] {
            let film = Film { awards: awards.into(), ..valid_film() };
            assert!(validate_at(&film, YEAR).is_ok());
        }
        for awards in ["yes", "NO", "Maybe", " Yes"] {
            let film = Film { awards: awards.into(), ..valid_film() };
            assert_eq!(
                validate_at(&film, YEAR),
                Err(ValidationError::InvalidAwards(awards.into()))
            );
        }
    }

    #[test]
    fn test_image_pattern() {
        for image in ["", "a.png", "a.jpg", "a.jpeg", "posters/big.poster.jpeg"] {
            let film = Film { image: image.into(), ..valid_film() };
            assert!(validate_at(&film, YEAR).is_ok(), "image {image}");
        }
        for image in ["a.gif", "noext", ".png", "a.PNG", "a.png.bak", "a.png\n"] {
            let film = Film { image: image.into(), ..valid_film() };
            let err = validate_at(&film, YEAR).unwrap_err();
            assert_eq!(err.field(), "image", "image {image:?}");
            assert!(err.to_string().ends_with(image));
        }
    }

    #[test]
    fn test_rule_order() {
        // year is reported before popularity, popularity before awards
        let film = Film {
            year: 1700,
            popularity: 200.0,
            awards: "Maybe".into(),
            ..valid_film()
        };
        assert_eq!(validate_at(&film, YEAR).unwrap_err().field(), "year");

        let film = Film {
            popularity: 200.0,
            awards: "Maybe".into(),
            image: "a.gif".into(),
            ..valid_film()
        };
        assert_eq!(validate_at(&film, YEAR).unwrap_err().field(), "popularity");

        let film = Film {
            awards: "Maybe".into(),
            image: "a.gif".into(),
            ..valid_film()
        };
        assert_eq!(validate_at(&film, YEAR).unwrap_err().field(), "awards");

        // pattern checks come before well-formedness
        let film = Film {
            subject: "bad\u{FFFD}".into(),
            image: "a.gif".into(),
            ..valid_film()
        };
        assert_eq!(validate_at(&film, YEAR).unwrap_err().field(), "image");
    }

    #[test]
    fn test_replacement_character_reports_field_and_offset() {
        let film = Film {
            actress: "Zoë\u{FFFD}x".into(),
            ..valid_film()
        };
        assert_eq!(
            validate_at(&film, YEAR),
            Err(ValidationError::InvalidCharacter {
                field: "actress",
                offset: 4,
                value: "Zoë\u{FFFD}x".into(),
            })
        );
    }

    #[test]
    fn test_text_fields_checked_in_order() {
        let film = Film {
            title: "\u{FFFD}".into(),
            director: "\u{FFFD}".into(),
            ..valid_film()
        };
        let err = validate_at(&film, YEAR).unwrap_err();
        assert_eq!(err.field(), "title");

        let film = Film {
            actor: "ok".into(),
            director: "Ridley\u{FFFD}".into(),
            image: "a\u{FFFD}.png".into(),
            ..valid_film()
        };
        assert_eq!(
            validate_at(&film, YEAR),
            Err(ValidationError::InvalidCharacter {
                field: "director",
                offset: 6,
                value: "Ridley\u{FFFD}".into(),
            })
        );
    }

    #[test]
    fn test_invalid_utf8_payload_reaches_validation() {
        let mut body = br#"{"title": "Heat", "year": 1995, "subject": "cr"#.to_vec();
        body.push(0xc3);
        body.extend_from_slice(br#"me"}"#);
        let film = Film::from_slice(&body).unwrap();
        let err = validate_at(&film, YEAR).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidCharacter {
                field: "subject",
                offset: 2,
                value: "cr\u{FFFD}me".into(),
            }
        );
    }
}
