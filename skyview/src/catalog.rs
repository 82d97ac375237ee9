//! Star catalog loading.
//!
//! A catalog is an ordered list of [`StarRecord`]s read from comma-separated
//! text with a header row. The row position is the star's identity for
//! constellation links, so rows are never reordered or filtered here.
//!
//! Loading is allowed to fail: [`CatalogSlot`] installs an empty catalog and
//! records why, so the viewer keeps running with zero stars while callers can
//! still tell "no stars" apart from "load failed".

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use sky_types::StarRecord;
use thiserror::Error;

/// Number of matches returned by a name search unless asked otherwise
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Errors raised while reading a catalog source
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse catalog: {0}")]
    Csv(#[from] csv::Error),
}

/// Column names of the catalog text format
mod columns {
    pub const ID: &str = "id";
    pub const RA: &str = "newra";
    pub const DEC: &str = "newdec";
    pub const MAG: &str = "newmag";
    pub const ABS_MAG: &str = "absmag";
    pub const DISTANCE: &str = "newdist";
    pub const TEMPERATURE: &str = "temperature";
    pub const SPECTRAL_TYPE: &str = "spectral_type";
    pub const NAME: &str = "name";
    pub const PROPER: &str = "proper";
    pub const CONSTELLATION: &str = "con";
}

/// Header positions of the columns we use. Missing columns stay `None`.
struct ColumnMap {
    id: Option<usize>,
    ra: Option<usize>,
    dec: Option<usize>,
    mag: Option<usize>,
    abs_mag: Option<usize>,
    distance: Option<usize>,
    temperature: Option<usize>,
    spectral_type: Option<usize>,
    name: Option<usize>,
    proper: Option<usize>,
    constellation: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        Self {
            id: find(columns::ID),
            ra: find(columns::RA),
            dec: find(columns::DEC),
            mag: find(columns::MAG),
            abs_mag: find(columns::ABS_MAG),
            distance: find(columns::DISTANCE),
            temperature: find(columns::TEMPERATURE),
            spectral_type: find(columns::SPECTRAL_TYPE),
            name: find(columns::NAME),
            proper: find(columns::PROPER),
            constellation: find(columns::CONSTELLATION),
        }
    }

    fn text<'r>(record: &'r csv::StringRecord, column: Option<usize>) -> &'r str {
        column.and_then(|c| record.get(c)).unwrap_or("").trim()
    }

    fn number(record: &csv::StringRecord, column: Option<usize>) -> f64 {
        Self::text(record, column).parse().unwrap_or(f64::NAN)
    }

    fn optional_text(record: &csv::StringRecord, column: Option<usize>) -> Option<String> {
        let value = Self::text(record, column);
        (!value.is_empty()).then(|| value.to_string())
    }

    fn star(&self, index: usize, record: &csv::StringRecord) -> StarRecord {
        StarRecord {
            index,
            catalog_id: Self::optional_text(record, self.id),
            ra_deg: Self::number(record, self.ra),
            dec_deg: Self::number(record, self.dec),
            apparent_magnitude: Self::number(record, self.mag),
            absolute_magnitude: Self::number(record, self.abs_mag),
            distance_parsec: Self::number(record, self.distance),
            temperature_kelvin: Self::number(record, self.temperature),
            spectral_type: Self::text(record, self.spectral_type).to_string(),
            proper_name: Self::optional_text(record, self.proper),
            catalog_name: Self::text(record, self.name).to_string(),
            constellation: Self::text(record, self.constellation).to_string(),
        }
    }
}

/// An immutable, index-addressed list of stars.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    stars: Vec<StarRecord>,
}

impl Catalog {
    /// Build a catalog from records, renumbering `index` to match position.
    pub fn from_stars(stars: Vec<StarRecord>) -> Self {
        let stars = stars
            .into_iter()
            .enumerate()
            .map(|(index, mut star)| {
                star.index = index;
                star
            })
            .collect();
        Self { stars }
    }

    /// Parse comma-separated text with a header row.
    ///
    /// Unparseable numeric fields become NaN; rows are kept in source order.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let map = ColumnMap::from_headers(rdr.headers()?);
        let stars = rdr
            .records()
            .enumerate()
            .map(|(index, result)| result.map(|record| map.star(index, &record)))
            .collect::<Result<Vec<_>, csv::Error>>()?;

        Ok(Self { stars })
    }

    /// Parse a catalog file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(std::io::BufReader::new(file))
    }

    /// Star at a catalog index
    pub fn get(&self, index: usize) -> Option<&StarRecord> {
        self.stars.get(index)
    }

    /// All stars in index order
    pub fn stars(&self) -> &[StarRecord] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Case-insensitive substring search over proper names (or designations
    /// for stars without one). Returns at most `limit` stars in catalog order.
    pub fn search_by_name(&self, query: &str, limit: usize) -> Vec<&StarRecord> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.stars
            .iter()
            .filter(|star| star.search_name().to_lowercase().contains(&needle))
            .take(limit)
            .collect()
    }
}

/// Handle for one catalog load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// State of the currently installed catalog
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    /// Nothing has been loaded yet
    Empty,
    /// A catalog loaded successfully (it may still have zero rows)
    Loaded,
    /// The last applied load failed; the installed catalog is empty
    Unavailable(String),
}

/// Result of handing a finished load to the slot
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The catalog was installed
    Applied { stars: usize },
    /// The load failed and an empty catalog was installed
    Unavailable(String),
    /// A newer load was started after this one; the result was dropped
    Superseded,
}

/// Holds the current catalog and guards against out-of-order load completion.
///
/// Each call to [`CatalogSlot::begin_load`] issues a newer ticket. A result is
/// only applied when it carries the newest ticket, so a slow earlier load can
/// never overwrite a catalog requested later.
#[derive(Debug)]
pub struct CatalogSlot {
    catalog: Arc<Catalog>,
    state: CatalogState,
    issued: u64,
}

impl CatalogSlot {
    pub fn new() -> Self {
        Self {
            catalog: Arc::new(Catalog::default()),
            state: CatalogState::Empty,
            issued: 0,
        }
    }

    /// Start a load; the returned ticket supersedes all earlier ones.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        LoadTicket(self.issued)
    }

    /// Finish a load started with `ticket`.
    pub fn complete(
        &mut self,
        ticket: LoadTicket,
        result: Result<Catalog, CatalogError>,
    ) -> LoadOutcome {
        if ticket.0 != self.issued {
            info!(
                "Dropping catalog load {} superseded by load {}",
                ticket.0, self.issued
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(catalog) => {
                let stars = catalog.len();
                info!("Loaded catalog with {stars} stars");
                self.catalog = Arc::new(catalog);
                self.state = CatalogState::Loaded;
                LoadOutcome::Applied { stars }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("Catalog unavailable, continuing with zero stars: {reason}");
                self.catalog = Arc::new(Catalog::default());
                self.state = CatalogState::Unavailable(reason.clone());
                LoadOutcome::Unavailable(reason)
            }
        }
    }

    /// Load synchronously from a file, going through the ticket check.
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> LoadOutcome {
        let ticket = self.begin_load();
        let result = Catalog::from_path(path);
        self.complete(ticket, result)
    }

    /// Shared handle to the installed catalog
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.catalog)
    }

    pub fn state(&self) -> &CatalogState {
        &self.state
    }
}

impl Default for CatalogSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE: &str = "\
id,name,proper,newra,newdec,newmag,absmag,newdist,temperature,spectral_type,con
32263,HIP 32349,Sirius,101.287,-16.716,-1.44,1.45,2.64,9940,A0m...,CMa
27919,HIP 27989,Betelgeuse,88.793,7.407,0.45,-5.85,152.7,3500,M1-2Ia-Iab,Ori
1,HIP 1,,0.0005,1.089,9.1,,,,F5,Psc
";

    #[test]
    fn test_parse_sample() {
        let catalog = Catalog::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);

        let sirius = catalog.get(0).unwrap();
        assert_eq!(sirius.index, 0);
        assert_eq!(sirius.catalog_id.as_deref(), Some("32263"));
        assert_eq!(sirius.proper_name.as_deref(), Some("Sirius"));
        assert_eq!(sirius.constellation, "CMa");
        assert_relative_eq!(sirius.ra_deg, 101.287);
        assert_relative_eq!(sirius.apparent_magnitude, -1.44);

        let faint = catalog.get(2).unwrap();
        assert_eq!(faint.index, 2);
        assert!(faint.proper_name.is_none());
        assert!(faint.absolute_magnitude.is_nan());
        assert!(faint.temperature_kelvin.is_nan());
        assert_eq!(faint.display_name(), "HIP 1");
    }

    #[test]
    fn test_missing_columns_are_nan() {
        let catalog = Catalog::from_csv_reader("name,newra\nX,not-a-number\n".as_bytes()).unwrap();
        let star = catalog.get(0).unwrap();
        assert!(star.ra_deg.is_nan());
        assert!(star.dec_deg.is_nan());
        assert!(!star.is_displayable());
    }

    #[test]
    fn test_search_by_name() {
        let catalog = Catalog::from_csv_reader(SAMPLE.as_bytes()).unwrap();

        let hits = catalog.search_by_name("SIR", DEFAULT_SEARCH_LIMIT);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 0);

        // Stars without a proper name are searched by designation
        let hits = catalog.search_by_name("hip 1", DEFAULT_SEARCH_LIMIT);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 2);

        assert!(catalog.search_by_name("   ", DEFAULT_SEARCH_LIMIT).is_empty());
        assert_eq!(catalog.search_by_name("e", 1).len(), 1);
    }

    #[test]
    fn test_from_stars_renumbers() {
        let parsed = Catalog::from_csv_reader(SAMPLE.as_bytes()).unwrap();
        let reversed: Vec<_> = parsed.stars().iter().rev().cloned().collect();
        let catalog = Catalog::from_stars(reversed);
        assert_eq!(catalog.get(0).unwrap().catalog_name, "HIP 1");
        assert_eq!(catalog.get(0).unwrap().index, 0);
        assert_eq!(catalog.get(2).unwrap().index, 2);
    }

    #[test]
    fn test_slot_applies_latest_load() {
        let mut slot = CatalogSlot::new();
        assert_eq!(slot.state(), &CatalogState::Empty);

        let ticket = slot.begin_load();
        let outcome = slot.complete(ticket, Catalog::from_csv_reader(SAMPLE.as_bytes()));
        assert_eq!(outcome, LoadOutcome::Applied { stars: 3 });
        assert_eq!(slot.state(), &CatalogState::Loaded);
        assert_eq!(slot.catalog().len(), 3);
    }

    #[test]
    fn test_slot_drops_superseded_load() {
        let mut slot = CatalogSlot::new();
        let first = slot.begin_load();
        let second = slot.begin_load();

        let small = Catalog::from_csv_reader("name,newra,newdec\nA,1,2\n".as_bytes());
        assert_eq!(slot.complete(second, small), LoadOutcome::Applied { stars: 1 });

        // The older request resolves late and must not replace the newer catalog
        let late = Catalog::from_csv_reader(SAMPLE.as_bytes());
        assert_eq!(slot.complete(first, late), LoadOutcome::Superseded);
        assert_eq!(slot.catalog().len(), 1);
    }

    #[test]
    fn test_slot_failed_load_is_unavailable() {
        let mut slot = CatalogSlot::new();
        let outcome = slot.load_path("/nonexistent/catalog.csv");
        assert!(matches!(outcome, LoadOutcome::Unavailable(_)));
        assert!(matches!(slot.state(), CatalogState::Unavailable(_)));
        assert!(slot.catalog().is_empty());
    }
}
