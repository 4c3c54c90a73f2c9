//! Molene meteorological observation loading.
//!
//! Hourly ground-station observations from Brittany, France, shipped as a
//! `RADOMEH.tar.gz` archive of per-station text files, plus a separately
//! hosted station README (ISO-8859-1, `;`-separated, behind a fixed-size
//! preamble).

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::error::{DataError, Result};
use crate::fetch::{download_file, fetch_and_unpack, ArchiveFormat};
use crate::io::{read_latin1, require_file};

/// Cache directory name of the data set.
pub const DATASET_NAME: &str = "MoleneMeteo";

/// Station README file name inside the cache directory.
const README_FILENAME: &str = "readme_radomeh.csv";

/// Lines before the station table in the README file.
const README_PREAMBLE_LINES: usize = 43;

/// Value marking a missing observation in the raw files.
const MISSING_VALUE: &str = "mq";

/// Free-text description of the data set.
pub const DESCRIPTION: &str = "\
The French national meteorological service made publicly available [1] a \
data set of hourly observations from a number of weather ground stations. \
Those stations are located in Brittany, France, and the data were collected \
during the month of January 2014. The stations recorded several \
meteorological variables, such as temperature, humidity, wind speed and \
direction, etc. Missing data (denoted by 'mq' in the original data) are \
replaced by NaNs.

In addition, the exact positions of the ground stations are provided.

Here is an excerpt of the README file that comes with the data.

    Descriptif  Mnémonique  type    unité
    Paramètres standard
    Indicatif INSEE station numer_sta   car
    Indicatif OMM station   id_omm  int
    Date    date    car
    Point de rosée  td  réel    K
    Température t    réel   K
    Température maximale de l'air   tx  réel    K
    Température minimale de l'air   tn  réel    K
    Humidité    u   int %
    Humidité maximale   ux  int %
    Humidité minimale   un  int %
    Direction du vent moyen 10 mn   dd    int   degré
    Vitesse du vent moyen 10 mn ff   réel   m/s
    Direction du vent moyen maximal dxy   int   degré
    Vitesse maximale du vent tmoyen fxy  réel   m/s
    Direction du vent instantané maximal    dxi   int   degré
    Vitesse maximale du vent instantané fxi  réel   m/s
    Précipitations dans  l'heure    rr1 réel    kg/m²
    Paramètres selon instrumentation spécifique
    Température à -10 cm    t_10    réel    K
    Température à -20 cm    t_20    réel    K
    Température à -50 cm    t_50    réel    K
    Température à -100 cm   t_100       K
    Visibilité horizontale  vv  réel    m
    Etat du sol etat_sol    int code
    Hauteur totale de la couche de neige    sss réel    m
    Nebulosité totale   n   réel    %
    Durée insolation    insolh  int mn
    Rayonnement global  ray_glo01   réel    J/m²
    Pression station    pres    int Pa
    Pression au niveau mer  pmer    int Pa

[1] https://www.data.gouv.fr/fr/datasets/projections-climatiques-sur-la-zone-large-molene-sur-un-mois/
";

/// A weather ground station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    /// INSEE station number.
    pub id: u64,
    /// Station name.
    pub name: String,
}

/// One hourly observation from one station.
#[derive(Debug, Clone)]
pub struct WeatherObservation {
    /// INSEE number of the recording station.
    pub station_id: u64,
    /// Station name, when the README lists the station.
    pub station_name: Option<String>,
    /// Observation time.
    pub date: NaiveDateTime,
    /// Sensor readings by column name; missing (`mq`) readings are NaN.
    pub values: BTreeMap<String, f64>,
}

/// The loaded data set: observations, stations and description.
#[derive(Debug, Clone)]
pub struct MoleneMeteoDataset {
    /// All observations, in file then row order.
    pub observations: Vec<WeatherObservation>,
    /// Ground stations from the README.
    pub stations: Vec<Station>,
    /// Data set description.
    pub description: String,
}

/// Load the Molene meteo data set, fetching archive and README into the
/// cache on first use.
pub fn load_molene_meteo(config: &Config) -> Result<MoleneMeteoDataset> {
    let dataset_dir = download(config)?;

    let readme_path = require_file(dataset_dir.join(README_FILENAME))?;
    let stations = read_stations(&read_latin1(&readme_path)?)?;
    let names: BTreeMap<u64, &str> = stations
        .iter()
        .map(|station| (station.id, station.name.as_str()))
        .collect();

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(&dataset_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("txt") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut observations = Vec::new();
    for path in &paths {
        let text = read_latin1(path)?;
        read_observations(&text, &names, &mut observations).map_err(|e| match e {
            DataError::Parse(msg) => DataError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;
    }

    Ok(MoleneMeteoDataset {
        observations,
        stations,
        description: DESCRIPTION.to_string(),
    })
}

/// Fetch the observation archive, then the README next to it. Both happen
/// only when the directory does not exist yet.
fn download(config: &Config) -> Result<PathBuf> {
    let store = CacheStore::new(&config.cache_home);
    let dataset_dir = store.local_path(DATASET_NAME);
    if store.is_populated(DATASET_NAME) {
        return Ok(dataset_dir);
    }

    fetch_and_unpack(&config.molene_meteo_url, &dataset_dir, ArchiveFormat::TarGz)?;
    download_file(
        &config.molene_meteo_readme_url,
        &dataset_dir.join(README_FILENAME),
    )?;
    Ok(dataset_dir)
}

/// Parse the station table from the README text.
///
/// The table starts after a fixed-size preamble and is `;`-separated; only
/// the `Numéro` and `Nom` columns are consumed. Rows with an unparsable
/// number are skipped.
fn read_stations(text: &str) -> Result<Vec<Station>> {
    let table = text
        .lines()
        .skip(README_PREAMBLE_LINES)
        .collect::<Vec<_>>()
        .join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .from_reader(table.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DataError::Parse(format!("station README: {}", e)))?
        .clone();
    let id_col = column(&headers, "Numéro").ok_or_else(|| {
        DataError::Parse("station README: no `Numéro` column".to_string())
    })?;
    let name_col = column(&headers, "Nom")
        .ok_or_else(|| DataError::Parse("station README: no `Nom` column".to_string()))?;

    let mut stations = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| DataError::Parse(format!("station README: {}", e)))?;
        let (Some(id), Some(name)) = (record.get(id_col), record.get(name_col)) else {
            continue;
        };
        let Ok(id) = id.trim().parse::<u64>() else {
            continue;
        };
        stations.push(Station {
            id,
            name: name.trim().to_string(),
        });
    }
    Ok(stations)
}

/// Parse one per-station observation file into `out`.
///
/// The files carry a trailing comma (one empty header cell, ignored), a
/// one-line footer, and `mq` for missing readings. Every column other than
/// the station number and the date columns is read as `f64`.
fn read_observations(
    text: &str,
    station_names: &BTreeMap<u64, &str>,
    out: &mut Vec<WeatherObservation>,
) -> Result<()> {
    let mut lines: Vec<&str> = text.lines().collect();
    // last line is a footer
    lines.pop();
    let body = lines.join("\n");

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DataError::Parse(e.to_string()))?
        .clone();
    let station_col = column(&headers, "numer_sta")
        .ok_or_else(|| DataError::Parse("no `numer_sta` column".to_string()))?;
    let date_col = column(&headers, "date")
        .ok_or_else(|| DataError::Parse("no `date` column".to_string()))?;

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DataError::Parse(e.to_string()))?;

        let station_id = record
            .get(station_col)
            .unwrap_or("")
            .trim()
            .parse::<u64>()
            .map_err(|_| DataError::Parse(format!("row {}: invalid station number", row)))?;
        let date = parse_date(record.get(date_col).unwrap_or(""))
            .map_err(|_| DataError::Parse(format!("row {}: invalid observation date", row)))?;

        let mut values = BTreeMap::new();
        for (col, header) in headers.iter().enumerate() {
            let header = header.trim();
            if header.is_empty()
                || col == station_col
                || col == date_col
                || header == "date_insert"
            {
                continue;
            }
            let raw = record.get(col).unwrap_or("").trim();
            let value = if raw.is_empty() || raw == MISSING_VALUE {
                f64::NAN
            } else {
                raw.parse::<f64>().unwrap_or(f64::NAN)
            };
            values.insert(header.to_string(), value);
        }

        out.push(WeatherObservation {
            station_id,
            station_name: station_names.get(&station_id).map(|name| name.to_string()),
            date,
            values,
        });
    }
    Ok(())
}

/// Observation timestamps come in the compact `YYYYMMDDHHMMSS` form; fall
/// back to the ISO form for reprocessed files.
fn parse_date(raw: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y%m%d%H%M%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S"))
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stations_are_read_after_the_preamble() {
        let mut text = "preamble;line\n".repeat(README_PREAMBLE_LINES);
        text.push_str("Numéro;Nom;Latitude;Longitude\n");
        text.push_str("29075;BREST-GUIPAVAS;48.44;-4.41\n");
        text.push_str("29276;PLEYBER-CHRIST;48.49;-3.87\n");
        text.push_str(";unnumbered;;\n");

        let stations = read_stations(&text).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0], Station {
            id: 29075,
            name: "BREST-GUIPAVAS".to_string()
        });
        assert_eq!(stations[1].name, "PLEYBER-CHRIST");
    }

    #[test]
    fn observations_handle_missing_values_and_footer() {
        let text = "\
numer_sta,date,t,u,
29075,20140101000000,276.5,mq,
29075,20140101010000,277.1,84,
this line is a footer";
        let names = BTreeMap::from([(29075u64, "BREST-GUIPAVAS")]);

        let mut observations = Vec::new();
        read_observations(text, &names, &mut observations).unwrap();

        assert_eq!(observations.len(), 2);
        let first = &observations[0];
        assert_eq!(first.station_id, 29075);
        assert_eq!(first.station_name.as_deref(), Some("BREST-GUIPAVAS"));
        assert_eq!(
            first.date,
            NaiveDateTime::parse_from_str("2014-01-01 00:00:00", "%Y-%m-%d %H:%M:%S").unwrap()
        );
        assert_eq!(first.values["t"], 276.5);
        assert!(first.values["u"].is_nan());
        // the trailing empty header produced no column
        assert_eq!(first.values.len(), 2);

        assert_eq!(observations[1].values["u"], 84.0);
    }

    #[test]
    fn unknown_stations_have_no_name() {
        let text = "\
numer_sta,date,t,
7,20140101000000,276.5,
footer";
        let mut observations = Vec::new();
        read_observations(text, &BTreeMap::new(), &mut observations).unwrap();
        assert_eq!(observations[0].station_name, None);
    }

    #[test]
    fn both_date_forms_parse() {
        assert!(parse_date("20140101013000").is_ok());
        assert!(parse_date("2014-01-01 01:30:00").is_ok());
        assert!(parse_date("January 1st").is_err());
    }
}
