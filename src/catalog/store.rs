//! SQLite-backed mammal catalogue.
//! Read side of the site plus first-run seeding from the bundled JSON
//! export. Listing is ordered by common name.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use tracing::{info, warn};

use super::map::{self, GeocodingData, MapData};
use super::Mammal;

const COLUMNS: &str = "id, common_name, binomial_name, description, habitat, distribution,
     extinction_causes, image_filename, continent, taxonomy_order";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("seed file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("seed parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mammal {0} not found")]
    NotFound(i64),
}

/// Fields for a new catalogue row.
#[derive(Debug, Clone, Default)]
pub struct NewMammal {
    pub common_name: String,
    pub binomial_name: String,
    pub description: String,
    pub habitat: Option<String>,
    pub distribution: Option<String>,
    pub extinction_causes: Option<String>,
    pub image_filename: Option<String>,
    pub continent: Option<String>,
    pub taxonomy_order: Option<String>,
}

/// On-disk seed format: `{"mammals": [...]}`.
#[derive(Debug, Deserialize)]
struct SeedFile {
    #[serde(default)]
    mammals: Vec<SeedMammal>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SeedMammal {
    common_name: String,
    binomial_name: String,
    description: String,
    distribution: String,
    habitat: String,
    extinction_cause: String,
    order: String,
    image_filename: String,
    continent: String,
}

impl From<SeedMammal> for NewMammal {
    fn from(s: SeedMammal) -> Self {
        Self {
            common_name: s.common_name,
            binomial_name: s.binomial_name,
            description: s.description,
            habitat: non_empty(s.habitat),
            distribution: non_empty(s.distribution),
            extinction_causes: non_empty(s.extinction_cause),
            image_filename: non_empty(s.image_filename),
            continent: non_empty(s.continent),
            taxonomy_order: non_empty(s.order),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Filters for the search endpoint. Blank or "all" region/taxonomy match everything.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub query: String,
    pub region: String,
    pub taxonomy: String,
}

/// One page of the catalogue listing.
#[derive(Debug, Clone)]
pub struct Page {
    pub items: Vec<Mammal>,
    /// 1-based page number actually served.
    pub number: usize,
    pub num_pages: usize,
    pub total: usize,
}

impl Page {
    pub fn has_next(&self) -> bool {
        self.number < self.num_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn is_paginated(&self) -> bool {
        self.num_pages > 1
    }
}

pub struct MammalStore {
    conn: Mutex<Connection>,
}

impl MammalStore {
    /// Open (or create) the catalogue database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        let store = Self::with_connection(conn)?;
        info!(path = %db_path.display(), "catalogue database opened");
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS mammals (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                common_name TEXT NOT NULL,
                binomial_name TEXT NOT NULL,
                description TEXT NOT NULL,
                habitat TEXT,
                distribution TEXT,
                extinction_causes TEXT,
                image_filename TEXT,
                continent TEXT,
                taxonomy_order TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_mammals_common_name ON mammals(common_name);
            CREATE INDEX IF NOT EXISTS idx_mammals_continent ON mammals(continent);
            CREATE INDEX IF NOT EXISTS idx_mammals_taxonomy ON mammals(taxonomy_order);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn insert(&self, m: &NewMammal) -> Result<i64, StoreError> {
        let conn = self.conn.lock();
        let now = now_unix();
        conn.execute(
            "INSERT INTO mammals
             (common_name, binomial_name, description, habitat, distribution,
              extinction_causes, image_filename, continent, taxonomy_order,
              created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                m.common_name,
                m.binomial_name,
                m.description,
                m.habitat,
                m.distribution,
                m.extinction_causes,
                m.image_filename,
                m.continent,
                m.taxonomy_order,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM mammals", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn get(&self, id: i64) -> Result<Mammal, StoreError> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM mammals WHERE id = ?1"),
                params![id],
                row_to_mammal,
            )
            .optional()?;
        found.ok_or(StoreError::NotFound(id))
    }

    /// Import every species from a seed document. Rows that fail to
    /// insert are logged and skipped. Returns the number inserted.
    pub fn import_json(&self, path: &Path) -> Result<usize, StoreError> {
        let content = std::fs::read_to_string(path)?;
        let seed: SeedFile = serde_json::from_str(&content)?;

        let mut inserted = 0;
        for entry in seed.mammals {
            let new = NewMammal::from(entry);
            match self.insert(&new) {
                Ok(_) => inserted += 1,
                Err(e) => {
                    warn!(name = %new.common_name, error = %e, "skipping seed entry");
                }
            }
        }
        info!(path = %path.display(), inserted, "catalogue seed imported");
        Ok(inserted)
    }

    /// Seed from `path` only when the catalogue is empty. Returns rows inserted.
    pub fn seed_if_empty(&self, path: &Path) -> Result<usize, StoreError> {
        if self.count()? > 0 {
            return Ok(0);
        }
        if !path.exists() {
            warn!(path = %path.display(), "seed file missing, catalogue left empty");
            return Ok(0);
        }
        self.import_json(path)
    }

    /// Page `requested` of the listing. A non-numeric page serves page 1;
    /// a page outside the range serves the last page.
    pub fn page(&self, requested: Option<&str>, per_page: usize) -> Result<Page, StoreError> {
        let per_page = per_page.max(1);
        let total = self.count()?;
        let num_pages = total.div_ceil(per_page).max(1);

        let number = match requested.map(|p| p.trim().parse::<i64>()) {
            None | Some(Err(_)) => 1,
            Some(Ok(n)) if n >= 1 && (n as usize) <= num_pages => n as usize,
            Some(Ok(_)) => num_pages,
        };

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM mammals ORDER BY common_name, id LIMIT ?1 OFFSET ?2"
        ))?;
        let items = stmt
            .query_map(
                params![per_page as i64, ((number - 1) * per_page) as i64],
                row_to_mammal,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page {
            items,
            number,
            num_pages,
            total,
        })
    }

    /// Every species, ordered by common name.
    pub fn all(&self) -> Result<Vec<Mammal>, StoreError> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare(&format!("SELECT {COLUMNS} FROM mammals ORDER BY common_name, id"))?;
        let mammals = stmt
            .query_map([], row_to_mammal)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(mammals)
    }

    /// Species grouped by approximate location for the global map.
    pub fn map_locations(&self, geo: &GeocodingData) -> Result<MapData, StoreError> {
        Ok(map::aggregate(&self.all()?, geo))
    }

    /// Case-insensitive search over names and description, with optional
    /// exact region and taxonomy filters.
    pub fn search(&self, filter: &SearchFilter) -> Result<Vec<Mammal>, StoreError> {
        let query = filter.query.trim().to_lowercase();
        let region = active_filter(&filter.region);
        let taxonomy = active_filter(&filter.taxonomy);

        let mut out = Vec::new();
        for mammal in self.all()? {
            if !query.is_empty()
                && ![&mammal.common_name, &mammal.binomial_name, &mammal.description]
                    .iter()
                    .any(|text| text.to_lowercase().contains(&query))
            {
                continue;
            }
            if !matches_exact(mammal.continent.as_deref(), region.as_deref()) {
                continue;
            }
            if !matches_exact(mammal.taxonomy_order.as_deref(), taxonomy.as_deref()) {
                continue;
            }
            out.push(mammal);
        }
        Ok(out)
    }
}

/// Lowercased filter value, or None when it should match everything.
fn active_filter(value: &str) -> Option<String> {
    let value = value.trim().to_lowercase();
    if value.is_empty() || value == "all" {
        None
    } else {
        Some(value)
    }
}

fn matches_exact(field: Option<&str>, wanted: Option<&str>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => field.is_some_and(|f| f.to_lowercase() == wanted),
    }
}

fn row_to_mammal(row: &Row<'_>) -> rusqlite::Result<Mammal> {
    Ok(Mammal {
        id: row.get(0)?,
        common_name: row.get(1)?,
        binomial_name: row.get(2)?,
        description: row.get(3)?,
        habitat: row.get(4)?,
        distribution: row.get(5)?,
        extinction_causes: row.get(6)?,
        image_filename: row.get(7)?,
        continent: row.get(8)?,
        taxonomy_order: row.get(9)?,
    })
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn species(name: &str, continent: &str, order: &str, description: &str) -> NewMammal {
        NewMammal {
            common_name: name.into(),
            binomial_name: format!("{name} extinctus"),
            description: description.into(),
            continent: Some(continent.into()),
            taxonomy_order: Some(order.into()),
            ..NewMammal::default()
        }
    }

    fn store_with(n: usize) -> MammalStore {
        let store = MammalStore::open_in_memory().unwrap();
        for i in 0..n {
            let name = format!("Espécie {i:03}");
            store
                .insert(&species(&name, "Europa", "Carnivora", "texto"))
                .unwrap();
        }
        store
    }

    #[test]
    fn insert_and_get() {
        let store = MammalStore::open_in_memory().unwrap();
        let id = store
            .insert(&species("Auroque", "Europa", "Artiodactyla", "Bovino selvagem."))
            .unwrap();
        let m = store.get(id).unwrap();
        assert_eq!(m.common_name, "Auroque");
        assert_eq!(m.continent.as_deref(), Some("Europa"));
        assert_eq!(m.habitat, None);
        assert!(matches!(store.get(id + 1), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn pagination_clamps_like_the_site() {
        let store = store_with(50);

        let first = store.page(None, 24).unwrap();
        assert_eq!(first.number, 1);
        assert_eq!(first.num_pages, 3);
        assert_eq!(first.items.len(), 24);
        assert_eq!(first.items[0].common_name, "Espécie 000");
        assert!(first.has_next() && !first.has_previous());

        let last = store.page(Some("99"), 24).unwrap();
        assert_eq!(last.number, 3);
        assert_eq!(last.items.len(), 2);

        assert_eq!(store.page(Some("abc"), 24).unwrap().number, 1);
        assert_eq!(store.page(Some("0"), 24).unwrap().number, 3);
        let second = store.page(Some("2"), 24).unwrap();
        assert_eq!(second.items[0].common_name, "Espécie 024");
    }

    #[test]
    fn empty_catalogue_has_one_empty_page() {
        let store = store_with(0);
        let page = store.page(Some("5"), 24).unwrap();
        assert_eq!(page.number, 1);
        assert_eq!(page.num_pages, 1);
        assert!(page.items.is_empty());
        assert!(!page.is_paginated());
    }

    #[test]
    fn search_filters() {
        let store = MammalStore::open_in_memory().unwrap();
        let rows = [
            ("Dodô", "África", "Columbiformes", "Ave não voadora das Ilhas Maurício."),
            ("Tigre-de-java", "Ásia", "Carnivora", "Felino de Java."),
            ("Lobo-da-tasmânia", "Oceania", "Dasyuromorphia", "Marsupial carnívoro."),
        ];
        for (name, continent, order, description) in rows {
            store.insert(&species(name, continent, order, description)).unwrap();
        }

        let all = store.search(&SearchFilter::default()).unwrap();
        assert_eq!(all.len(), 3);

        let by_text = store
            .search(&SearchFilter {
                query: "JAVA".into(),
                ..SearchFilter::default()
            })
            .unwrap();
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].common_name, "Tigre-de-java");

        let by_region = store
            .search(&SearchFilter {
                region: "ásia".into(),
                ..SearchFilter::default()
            })
            .unwrap();
        assert_eq!(by_region.len(), 1);

        let everything = store
            .search(&SearchFilter {
                region: "All".into(),
                taxonomy: "ALL".into(),
                ..SearchFilter::default()
            })
            .unwrap();
        assert_eq!(everything.len(), 3);

        let none = store
            .search(&SearchFilter {
                query: "marsupial".into(),
                taxonomy: "carnivora".into(),
                ..SearchFilter::default()
            })
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn seed_import_maps_fields_and_runs_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mammals_complete.json");
        std::fs::write(
            &path,
            r#"{"mammals": [
                {"common_name": "Vaca-marinha-de-steller",
                 "binomial_name": "Hydrodamalis gigas",
                 "description": "Sirênio gigante.", "extinction_cause": "Caça",
                 "order": "Sirenia",
                 "continent": "Ásia", "habitat": ""},
                {"common_name": "Quagga", "binomial_name": "Equus quagga quagga",
                 "description": "Zebra parcialmente listrada."}
            ]}"#,
        )
        .unwrap();

        let store = MammalStore::open(&dir.path().join("catalog.db")).unwrap();
        assert_eq!(store.seed_if_empty(&path).unwrap(), 2);
        assert_eq!(store.seed_if_empty(&path).unwrap(), 0);
        assert_eq!(store.count().unwrap(), 2);

        let page = store.page(None, 24).unwrap();
        let steller = &page.items[1];
        assert_eq!(steller.common_name, "Vaca-marinha-de-steller");
        assert_eq!(steller.extinction_causes.as_deref(), Some("Caça"));
        assert_eq!(steller.taxonomy_order.as_deref(), Some("Sirenia"));
        assert_eq!(steller.habitat, None);
    }

    #[test]
    fn seeded_catalogue_feeds_the_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mammals_complete.json");
        std::fs::write(
            &path,
            r#"{"mammals": [
                {"common_name": "Dodô", "binomial_name": "Raphus cucullatus",
                 "description": "Ave.", "continent": "África",
                 "coordinates": [{"lat": -20.3, "lon": 57.5, "location": "Maurício"}]},
                {"common_name": "Solitário-de-rodrigues", "binomial_name": "Pezophaps solitaria",
                 "description": "Ave.", "continent": "África",
                 "coordinates": [{"lat": -19.7, "lon": 57.6}]},
                {"common_name": "Quagga", "binomial_name": "Equus quagga quagga",
                 "description": "Zebra."}
            ]}"#,
        )
        .unwrap();

        let store = store_with(0);
        store.seed_if_empty(&path).unwrap();
        let geo = GeocodingData::load(&path).unwrap();
        let data = store.map_locations(&geo).unwrap();

        assert_eq!(data.statistics.total_locations, 1);
        assert_eq!(data.statistics.total_species, 2);
        assert_eq!(data.statistics.max_concentration, 2);
        let names: Vec<_> = data.locations[0]
            .species
            .iter()
            .map(|s| s.common_name.as_str())
            .collect();
        assert_eq!(names, ["Dodô", "Solitário-de-rodrigues"]);
        assert_eq!(data.locations[0].species[0].continent, "África");
    }

    #[test]
    fn missing_seed_file_is_not_an_error() {
        let store = store_with(0);
        let missing = Path::new("/nonexistent/seed.json");
        assert_eq!(store.seed_if_empty(missing).unwrap(), 0);
    }

    #[test]
    fn malformed_seed_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").unwrap();
        let store = store_with(0);
        assert!(matches!(store.import_json(&path), Err(StoreError::Json(_))));
    }
}
