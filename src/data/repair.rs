//! Backward-compatibility repair for datasets read from the flat file
//!
//! Older cache files may lack any of the derived columns (`genres`,
//! `genres_str`, `gems_score`, `year`) and always store dates and sequences
//! as text. [`normalize`] restores types and computes the local derived
//! columns; [`rebuild_genres`] fills in genre names once a genre map is
//! available.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use super::literal::parse_sequence;
use super::{
    Dataset, DatasetError, GenreMap, Value, GEMS_SCORE, GENRES, GENRES_STR, GENRE_IDS, POPULARITY,
    RELEASE_DATE, VOTE_AVERAGE, VOTE_COUNT, YEAR,
};

/// Name used for genre IDs missing from the map, and for rows with no genres
pub const UNKNOWN_GENRE: &str = "Unknown";

/// Restores column types and computes `gems_score` and `year` when absent
///
/// Runs, in order: date parsing of `release_date`, sequence parsing of
/// `genre_ids`, the derived score and year, then sequence parsing of
/// `genres`. Individual bad cells fall back to null or an empty sequence;
/// only a missing input column or a non-numeric score input is an error.
pub fn normalize(dataset: &mut Dataset) -> Result<(), DatasetError> {
    let dates = dataset.require(RELEASE_DATE)?.iter().map(parse_date).collect();
    dataset.set_column(RELEASE_DATE, dates)?;

    normalize_sequences(dataset, GENRE_IDS)?;

    if !dataset.has_column(GEMS_SCORE) {
        let scores = gems_scores(dataset)?;
        dataset.set_column(GEMS_SCORE, scores)?;
    }

    if !dataset.has_column(YEAR) {
        let years = dataset
            .require(RELEASE_DATE)?
            .iter()
            .map(|v| match v.as_date() {
                Some(date) => Value::Int(i64::from(date.year())),
                None => Value::Null,
            })
            .collect();
        dataset.set_column(YEAR, years)?;
    }

    normalize_sequences(dataset, GENRES)?;
    Ok(())
}

/// Whether `genres` and `genres_str` must be rebuilt from `genre_ids`
pub fn needs_genre_rebuild(dataset: &Dataset) -> bool {
    !dataset.has_column(GENRES) || !dataset.has_column(GENRES_STR)
}

/// Rebuilds `genres` and `genres_str` from `genre_ids`, overwriting both
pub fn rebuild_genres(dataset: &mut Dataset, genre_map: &GenreMap) -> Result<(), DatasetError> {
    let names: Vec<Vec<String>> = dataset
        .require(GENRE_IDS)?
        .iter()
        .map(|ids| genre_names(ids, genre_map))
        .collect();

    let joined = names.iter().map(|n| Value::Text(join_genres(n))).collect();
    let genres = names
        .into_iter()
        .map(|n| Value::List(n.into_iter().map(Value::Text).collect()))
        .collect();

    dataset.set_column(GENRES, genres)?;
    dataset.set_column(GENRES_STR, joined)?;
    Ok(())
}

/// Joins genre names for display, `"Unknown"` when there are none
pub fn join_genres(names: &[String]) -> String {
    if names.is_empty() {
        UNKNOWN_GENRE.to_string()
    } else {
        names.join(", ")
    }
}

/// `(vote_average * log10(vote_count + 1)) / (popularity + 1)`
///
/// Returns `None` when any input is missing.
pub fn gems_score(
    vote_average: Option<f64>,
    vote_count: Option<f64>,
    popularity: Option<f64>,
) -> Option<f64> {
    let score = vote_average? * (vote_count? + 1.0).log10() / (popularity? + 1.0);
    (!score.is_nan()).then_some(score)
}

fn gems_scores(dataset: &Dataset) -> Result<Vec<Value>, DatasetError> {
    let vote_average = numeric_column(dataset, VOTE_AVERAGE)?;
    let vote_count = numeric_column(dataset, VOTE_COUNT)?;
    let popularity = numeric_column(dataset, POPULARITY)?;

    Ok(vote_average
        .into_iter()
        .zip(vote_count)
        .zip(popularity)
        .map(|((va, vc), pop)| Value::Float(gems_score(va, vc, pop).unwrap_or(0.0)))
        .collect())
}

fn numeric_column(dataset: &Dataset, name: &str) -> Result<Vec<Option<f64>>, DatasetError> {
    dataset
        .require(name)?
        .iter()
        .map(|value| match value {
            Value::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
            Value::Text(_) | Value::Date(_) | Value::List(_) => {
                Err(DatasetError::NonNumeric(name.to_string()))
            }
            other => Ok(other.as_f64()),
        })
        .collect()
}

fn normalize_sequences(dataset: &mut Dataset, name: &str) -> Result<(), DatasetError> {
    let Some(column) = dataset.column(name) else {
        return Ok(());
    };
    let values = column
        .values
        .iter()
        .map(|v| Value::List(parse_sequence(v)))
        .collect();
    dataset.set_column(name, values)
}

/// Parses a `release_date` cell, yielding `Null` for anything unrecognized
fn parse_date(value: &Value) -> Value {
    match value {
        Value::Date(date) => Value::Date(*date),
        Value::Text(text) => parse_date_text(text.trim()).map_or(Value::Null, Value::Date),
        _ => Value::Null,
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

fn genre_names(ids: &Value, genre_map: &GenreMap) -> Vec<String> {
    let Some(ids) = ids.as_list() else {
        return Vec::new();
    };
    ids.iter()
        .map(|id| {
            genre_id(id)
                .and_then(|id| genre_map.get(&id))
                .cloned()
                .unwrap_or_else(|| UNKNOWN_GENRE.to_string())
        })
        .collect()
}

/// Integer view of a genre ID; integral floats such as `28.0` count too
fn genre_id(value: &Value) -> Option<i64> {
    match value {
        Value::Int(id) => Some(*id),
        Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::read_dataset;

    fn read(text: &str) -> Dataset {
        read_dataset(text.as_bytes()).expect("CSV should parse")
    }

    fn genre_map() -> GenreMap {
        GenreMap::from([(28, "Action".to_string()), (12, "Adventure".to_string())])
    }

    #[test]
    fn test_release_dates_are_parsed_or_nulled() {
        let mut dataset = read(
            "release_date,genres,genres_str,gems_score,year\n\
             2019-10-04,[],Unknown,0,2019\n\
             not a date,[],Unknown,0,\n\
             ,[],Unknown,0,\n\
             2001-02-03 00:00:00,[],Unknown,0,2001\n",
        );
        normalize(&mut dataset).unwrap();

        assert_eq!(
            dataset.row_value(0, RELEASE_DATE),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2019, 10, 4).unwrap()))
        );
        assert_eq!(dataset.row_value(1, RELEASE_DATE), Some(&Value::Null));
        assert_eq!(dataset.row_value(2, RELEASE_DATE), Some(&Value::Null));
        assert_eq!(
            dataset.row_value(3, RELEASE_DATE),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2001, 2, 3).unwrap()))
        );
    }

    #[test]
    fn test_missing_release_date_column_is_an_error() {
        let mut dataset = read("id\n1\n");
        let err = normalize(&mut dataset).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == RELEASE_DATE));
    }

    #[test]
    fn test_genre_ids_become_sequences() {
        let mut dataset = read(
            "release_date,genre_ids,gems_score,year\n\
             2020-01-01,\"[28, 12]\",1.0,2020\n\
             2020-01-01,,1.0,2020\n\
             2020-01-01,\"[28, oops\",1.0,2020\n",
        );
        normalize(&mut dataset).unwrap();

        assert_eq!(
            dataset.row_value(0, GENRE_IDS),
            Some(&Value::from(vec![28i64, 12]))
        );
        assert_eq!(dataset.row_value(1, GENRE_IDS), Some(&Value::List(vec![])));
        assert_eq!(dataset.row_value(2, GENRE_IDS), Some(&Value::List(vec![])));
    }

    #[test]
    fn test_gems_score_computed_when_missing() {
        let mut dataset = read(
            "release_date,vote_average,vote_count,popularity\n\
             2020-01-01,8.0,999,9.0\n\
             2020-01-01,,10,1.0\n\
             2020-01-01,7.0,0,0\n",
        );
        normalize(&mut dataset).unwrap();

        let expected = 8.0 * 1000f64.log10() / 10.0;
        let first = dataset.row_value(0, GEMS_SCORE).unwrap().as_f64().unwrap();
        assert!((first - expected).abs() < 1e-9);
        // Missing vote_average falls back to zero
        assert_eq!(dataset.row_value(1, GEMS_SCORE), Some(&Value::Float(0.0)));
        assert_eq!(dataset.row_value(2, GEMS_SCORE), Some(&Value::Float(0.0)));
    }

    #[test]
    fn test_existing_gems_score_is_kept() {
        let mut dataset = read(
            "release_date,gems_score,year\n\
             2020-01-01,3.25,2020\n",
        );
        normalize(&mut dataset).unwrap();
        assert_eq!(dataset.row_value(0, GEMS_SCORE), Some(&Value::Float(3.25)));
    }

    #[test]
    fn test_gems_score_requires_vote_columns() {
        let mut dataset = read("release_date,vote_average\n2020-01-01,8.0\n");
        let err = normalize(&mut dataset).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == VOTE_COUNT));
    }

    #[test]
    fn test_gems_score_rejects_text_inputs() {
        let mut dataset = read(
            "release_date,vote_average,vote_count,popularity\n\
             2020-01-01,great,10,1.0\n",
        );
        let err = normalize(&mut dataset).unwrap_err();
        assert!(matches!(err, DatasetError::NonNumeric(ref c) if c == VOTE_AVERAGE));
    }

    #[test]
    fn test_year_derived_from_release_date() {
        let mut dataset = read(
            "release_date,gems_score\n\
             1999-03-31,1.0\n\
             garbage,1.0\n",
        );
        normalize(&mut dataset).unwrap();

        assert_eq!(dataset.row_value(0, YEAR), Some(&Value::Int(1999)));
        assert_eq!(dataset.row_value(1, YEAR), Some(&Value::Null));
    }

    #[test]
    fn test_genres_text_parsed_and_malformed_dropped() {
        let mut dataset = read(
            "release_date,gems_score,year,genres\n\
             2020-01-01,1.0,2020,\"['Action', 'Adventure']\"\n\
             2020-01-01,1.0,2020,\"['Action', \"\n\
             2020-01-01,1.0,2020,Action\n",
        );
        normalize(&mut dataset).unwrap();

        assert_eq!(
            dataset.row_value(0, GENRES),
            Some(&Value::from(vec!["Action", "Adventure"]))
        );
        assert_eq!(dataset.row_value(1, GENRES), Some(&Value::List(vec![])));
        assert_eq!(dataset.row_value(2, GENRES), Some(&Value::List(vec![])));
    }

    #[test]
    fn test_needs_genre_rebuild() {
        let complete = read("genres,genres_str\n[],Unknown\n");
        let no_str = read("genres\n[]\n");
        let no_genres = read("genres_str\nUnknown\n");

        assert!(!needs_genre_rebuild(&complete));
        assert!(needs_genre_rebuild(&no_str));
        assert!(needs_genre_rebuild(&no_genres));
    }

    #[test]
    fn test_rebuild_genres_maps_ids_through_map() {
        let mut dataset = Dataset::new()
            .with_column(
                GENRE_IDS,
                vec![
                    Value::from(vec![28i64, 12]),
                    Value::from(vec![28i64, 99]),
                    Value::List(vec![]),
                ],
            )
            .unwrap();

        rebuild_genres(&mut dataset, &genre_map()).unwrap();

        assert_eq!(
            dataset.row_value(0, GENRES),
            Some(&Value::from(vec!["Action", "Adventure"]))
        );
        assert_eq!(
            dataset.row_value(0, GENRES_STR),
            Some(&"Action, Adventure".into())
        );
        assert_eq!(
            dataset.row_value(1, GENRES),
            Some(&Value::from(vec!["Action", "Unknown"]))
        );
        assert_eq!(dataset.row_value(2, GENRES), Some(&Value::List(vec![])));
        assert_eq!(dataset.row_value(2, GENRES_STR), Some(&"Unknown".into()));
    }

    #[test]
    fn test_rebuild_genres_overwrites_existing_values() {
        let mut dataset = Dataset::new()
            .with_column(GENRE_IDS, vec![Value::from(vec![12i64])])
            .unwrap()
            .with_column(GENRES, vec![Value::from(vec!["Stale"])])
            .unwrap();

        rebuild_genres(&mut dataset, &genre_map()).unwrap();

        assert_eq!(dataset.row_value(0, GENRES), Some(&Value::from(vec!["Adventure"])));
        assert_eq!(dataset.row_value(0, GENRES_STR), Some(&"Adventure".into()));
    }

    #[test]
    fn test_rebuild_genres_requires_genre_ids() {
        let mut dataset = read("title\nHeat\n");
        let err = rebuild_genres(&mut dataset, &genre_map()).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(ref c) if c == GENRE_IDS));
    }

    #[test]
    fn test_rebuild_accepts_integral_float_ids() {
        let mut dataset = Dataset::new()
            .with_column(GENRE_IDS, vec![Value::List(vec![Value::Float(28.0), Value::Float(1.5)])])
            .unwrap();

        rebuild_genres(&mut dataset, &genre_map()).unwrap();

        assert_eq!(dataset.row_value(0, GENRES_STR), Some(&"Action, Unknown".into()));
    }

    #[test]
    fn test_gems_score_formula() {
        assert_eq!(gems_score(None, Some(1.0), Some(1.0)), None);
        assert_eq!(gems_score(Some(5.0), Some(0.0), Some(0.0)), Some(0.0));
        let score = gems_score(Some(6.0), Some(9.0), Some(1.0)).unwrap();
        assert!((score - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_join_genres() {
        assert_eq!(join_genres(&[]), "Unknown");
        assert_eq!(
            join_genres(&["Drama".to_string(), "Crime".to_string()]),
            "Drama, Crime"
        );
    }
}
