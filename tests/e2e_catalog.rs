// faamcat - tests/e2e_catalog.rs
//
// End-to-end tests for the catalogue pipeline.
//
// These tests build real directory trees in temporary directories and run
// the real product loading, walkdir traversal, filename classification and
// FileSet resolution over them. Detector runs go through MemoryLoader
// registered for the flat-variable family, since no data file is decoded
// here.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use faamcat::app::analysis::FlightSummaryExt;
use faamcat::app::catalog::Catalog;
use faamcat::app::product_mgr;
use faamcat::core::data_model::{MemoryLoader, ModelLoaders};
use faamcat::core::detect::{LevelRunParams, ProfileParams};
use faamcat::core::discovery::DiscoveryConfig;
use faamcat::core::model::{Frequency, ModelKind, Selection};
use faamcat::core::product::ProductRegistry;
use faamcat::core::series::TimeSeries;
use faamcat::util::error::{FaamError, ResolveError};
use std::fs;
use std::path::{Path, PathBuf};

// =============================================================================
// Helpers
// =============================================================================

/// One file name per built-in product. The calibration files carry their
/// instrument name in the flight-number position.
const ONE_PER_PRODUCT: &[(&str, &str)] = &[
    ("core", "core_faam_20200130_v005_r0_c224.nc"),
    ("corefltsum", "flight-sum_faam_20200130_r0_c224.csv"),
    ("ccp", "core-cloud-phy_faam_20200130_v501_r0_c224.nc"),
    ("ccpCIP15", "core-cloud-phy_faam_20200130_v501_r0_c224_cip15.nc"),
    ("ccpCIP25", "core-cloud-phy_faam_20200130_v501_r0_c224_cip25.nc"),
    ("ccpCIP100", "core-cloud-phy_faam_20200130_v501_r0_c224_cip100.nc"),
    ("ccpCAS", "core-cloud-phy_faam_20200130_v501_r0_c224_cas.nc"),
    ("ccpCDPcal", "CDP-1_faam_20200130_v001_r0_cal.nc"),
    ("ccpPCASPcal", "PCASP-1_faam_20200130_v001_r0_cal.nc"),
];

const SUMMARY_CSV: &str = "\
Event,Start,Start Hdg,Start Hgt,Start Lat,Start Long,Stop,Stop Hdg,Stop Hgt,Stop Lat,Stop Long,Comment
T/O,2020-01-30 10:00:05,270,0.01,52.07,-0.61,,,,,,
Profile 1,2020-01-30 10:05:00,270,0.1,52.1,-0.7,2020-01-30 10:20:00,90,6.5,52.3,-1.2,climb to FL210
Run 1,2020-01-30 10:25:00,90,6.5,52.3,-1.2,2020-01-30 10:40:00,90,6.5,52.4,-2.0,
Land,2020-01-30 12:00:00,90,0.01,52.07,-0.61,,,,,,
";

fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, "").unwrap();
    path
}

fn scan(roots: &[PathBuf]) -> (Catalog, faamcat::app::catalog::ScanReport) {
    Catalog::scan(ProductRegistry::builtin(), roots, &DiscoveryConfig::default())
}

fn t0() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2020, 1, 30)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

// =============================================================================
// Catalogue E2E
// =============================================================================

/// One file per product plus one unrelated file: every file lands in the
/// FileSet of its product and nothing is reported as an error.
#[test]
fn e2e_one_file_per_product() {
    let dir = tempfile::tempdir().unwrap();
    for (_, name) in ONE_PER_PRODUCT {
        touch(dir.path(), name);
    }
    touch(dir.path(), "README.txt");

    let (catalog, report) = scan(&[dir.path().to_path_buf()]);
    assert!(report.errors.is_empty(), "unexpected errors: {:?}", report.errors);
    assert!(report.warnings.is_empty(), "unexpected warnings: {:?}", report.warnings);
    assert_eq!(report.files_visited, ONE_PER_PRODUCT.len() + 1);
    assert_eq!(report.files_classified, ONE_PER_PRODUCT.len());
    assert_eq!(report.unmatched, 1);

    // c224 plus the two calibration "flights".
    assert_eq!(catalog.len(), 3);

    let c224 = catalog.flight("c224").unwrap();
    assert_eq!(c224.date(), NaiveDate::from_ymd_opt(2020, 1, 30).unwrap());
    let mut hooks: Vec<&str> = c224.hooks().collect();
    hooks.sort_unstable();
    let mut expected: Vec<&str> = ONE_PER_PRODUCT
        .iter()
        .map(|(hook, _)| *hook)
        .filter(|h| !h.ends_with("cal"))
        .collect();
    expected.sort_unstable();
    assert_eq!(hooks, expected);

    for (hook, name) in ONE_PER_PRODUCT {
        let flight = if hook.ends_with("cal") {
            catalog.flight(name.split('_').next().unwrap()).unwrap()
        } else {
            c224
        };
        let fileset = flight.accessor(hook).unwrap();
        assert_eq!(fileset.len(), 1, "{hook}");
        assert!(fileset.resolve().unwrap().path().ends_with(name), "{hook}");
    }
}

/// Versions spread across nested directories resolve to the newest
/// version, newest revision, fastest rate.
#[test]
fn e2e_nested_versions_autoselect() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "2020/c224/core_faam_20200130_v004_r2_c224.nc");
    touch(dir.path(), "2020/c224/core_faam_20200130_v005_r0_c224_1hz.nc");
    touch(dir.path(), "2020/c224/v5/core_faam_20200130_v005_r1_c224_1hz.nc");
    touch(dir.path(), "2020/c224/v5/core_faam_20200130_v005_r1_c224.nc");
    touch(dir.path(), "2020/c225/core_faam_20200131_v005_r0_c225.nc");

    let (mut catalog, report) = scan(&[dir.path().to_path_buf()]);
    assert_eq!(report.files_classified, 5);
    assert_eq!(catalog.len(), 2);

    let core = catalog.flight_mut("c224").unwrap().accessor_mut("core").unwrap();
    assert_eq!(core.version(), Some(5));
    assert_eq!(core.revision(), Some(1));
    assert_eq!(core.frequency(), Some(Frequency::Full));
    assert!(core
        .resolve()
        .unwrap()
        .path()
        .ends_with("core_faam_20200130_v005_r1_c224.nc"));

    // Pinning v4 alone fails: no v4 file has revision 1.
    assert!(core.set_version(Some(4)).is_err());
    core.set(Selection {
        version: Some(4),
        revision: Some(2),
        frequency: Some(Frequency::Full),
    })
    .unwrap();
    assert!(core
        .resolve()
        .unwrap()
        .path()
        .ends_with("core_faam_20200130_v004_r2_c224.nc"));

    // A pin with no matching file fails and leaves the pins alone.
    let err = core.set_frequency(Some(Frequency::Hz(32))).unwrap_err();
    assert!(matches!(err, ResolveError::NoMatch { .. }));
    assert_eq!(core.version(), Some(4));
}

/// Excluded directories are not descended into.
#[test]
fn e2e_excluded_directories_are_pruned() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "core_faam_20200130_v005_r0_c224.nc");
    touch(dir.path(), "scratch/core_faam_20200130_v006_r0_c224.nc");
    touch(dir.path(), "core_faam_20200130_v007_r0_c224.nc.part");

    let config = DiscoveryConfig {
        exclude_patterns: vec!["scratch".to_string(), "*.part".to_string()],
        ..Default::default()
    };
    let (catalog, report) =
        Catalog::scan(ProductRegistry::builtin(), &[dir.path().to_path_buf()], &config);
    assert_eq!(report.files_visited, 1);

    let core = catalog.flight("c224").unwrap().accessor("core").unwrap();
    assert_eq!(core.versions().into_iter().collect::<Vec<_>>(), vec![5]);
}

/// A user product directory can add a new hook that the scan then routes.
#[test]
fn e2e_user_product_is_scanned() {
    let products = tempfile::tempdir().unwrap();
    fs::write(
        products.path().join("nevzorov.toml"),
        r#"
[product]
hook = "nevzorov"
name = "Nevzorov sensor"

[pattern]
filename = '^nevzorov_faam_(?P<date>[0-9]{8})_v(?P<version>[0-9]{3})_r(?P<revision>[0-9]+)_(?P<flightnum>[a-z][0-9]{3})\.(?P<ext>nc)$'
"#,
    )
    .unwrap();

    let data = tempfile::tempdir().unwrap();
    touch(data.path(), "nevzorov_faam_20200130_v001_r0_c224.nc");
    touch(data.path(), "core_faam_20200130_v005_r0_c224.nc");

    let (registry, errors) = product_mgr::build_registry(Some(products.path()));
    assert!(errors.is_empty(), "{errors:?}");
    let (catalog, report) = Catalog::scan(
        registry,
        &[data.path().to_path_buf()],
        &DiscoveryConfig::default(),
    );
    assert_eq!(report.files_classified, 2);

    let c224 = catalog.flight("c224").unwrap();
    assert!(c224.has_accessor("nevzorov"));
    assert!(c224.has_accessor("core"));
}

// =============================================================================
// Flight summary and analysis E2E
// =============================================================================

/// The resolved flight-summary CSV is read from disk and queried.
#[test]
fn e2e_flight_summary_queries() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "core_faam_20200130_v005_r0_c224.nc");
    fs::write(
        dir.path().join("flight-sum_faam_20200130_r0_c224.csv"),
        SUMMARY_CSV,
    )
    .unwrap();
    // An older revision that must not be the one read.
    fs::write(
        dir.path().join("flight-sum_faam_20200130_r1_c224.csv"),
        "",
    )
    .unwrap();
    fs::write(
        dir.path().join("flight-sum_faam_20200130_r2_c224.txt"),
        "",
    )
    .unwrap();

    let (mut catalog, _) = scan(&[dir.path().to_path_buf()]);
    let flight = catalog.flight_mut("c224").unwrap();

    // The newest revision is the text file, which cannot be read.
    assert!(matches!(flight.summary(), Err(FaamError::Summary(_))));

    flight
        .accessor_mut("corefltsum")
        .unwrap()
        .set_revision(Some(0))
        .unwrap();
    let summary = flight.summary().unwrap();
    assert_eq!(summary.len(), 4);

    let current: Vec<&str> = summary
        .at(t0() + Duration::minutes(30), Duration::seconds(60))
        .iter()
        .map(|e| e.event.as_str())
        .collect();
    assert_eq!(current, vec!["Run 1"]);

    let (start, stop) = summary.event_window("profile 1").unwrap();
    assert_eq!(start, t0() + Duration::minutes(5));
    assert_eq!(stop, Some(t0() + Duration::minutes(20)));
}

/// Level-run detection against a scanned flight loads the resolved file.
#[test]
fn e2e_level_runs_on_scanned_flight() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "core_faam_20200130_v005_r0_c224.nc");
    let one_hz = touch(dir.path(), "core_faam_20200130_v005_r0_c224_1hz.nc");

    let (mut catalog, _) = scan(&[dir.path().to_path_buf()]);
    let flight = catalog.flight_mut("c224").unwrap();
    flight
        .accessor_mut("core")
        .unwrap()
        .set_frequency(Some(Frequency::Hz(1)))
        .unwrap();

    let n = 300;
    let table = TimeSeries::regular(t0(), 1, n)
        .unwrap()
        .with_channel("WOW_IND", vec![0.0; n])
        .unwrap()
        .with_channel("PS_RVSM", vec![650.0; n])
        .unwrap()
        .with_channel("ROLL_GIN", vec![0.5; n])
        .unwrap();
    let loaders =
        ModelLoaders::new().with(ModelKind::FlatVariable, MemoryLoader::new().with(one_hz, table));

    let runs = catalog
        .analysis("c224", &loaders)
        .unwrap()
        .level_runs(&LevelRunParams::default())
        .unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].start(), Some(t0() + Duration::seconds(64)));
    assert_eq!(runs[0].len(), 177);
}

/// Command-line style pins: fields not given keep their current pins.
#[test]
fn e2e_partial_pins_keep_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "core_faam_20200130_v001_r0_c224_1hz.nc");
    touch(dir.path(), "core_faam_20200130_v001_r1_c224_1hz.nc");
    touch(dir.path(), "core_faam_20200130_v002_r0_c224_1hz.nc");

    let (mut catalog, _) = scan(&[dir.path().to_path_buf()]);
    let core = catalog.flight_mut("c224").unwrap().accessor_mut("core").unwrap();
    assert_eq!(core.version(), Some(2));

    core.update(Selection {
        version: Some(1),
        ..Default::default()
    })
    .unwrap();
    assert_eq!(core.revision(), Some(0));
    let resolution = core.resolve().unwrap();
    assert!(resolution.ambiguity.is_none());
    assert!(resolution
        .path()
        .ends_with("core_faam_20200130_v001_r0_c224_1hz.nc"));
}

/// Hierarchical products are read by the loader for their own family.
#[test]
fn e2e_cloud_physics_uses_group_loader() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "core_faam_20200130_v005_r0_c224_1hz.nc");
    let ccp = touch(dir.path(), "core-cloud-phy_faam_20200130_v501_r0_c224.nc");

    let (catalog, _) = scan(&[dir.path().to_path_buf()]);

    // Descent from 500 to 800 hPa at 1 hPa/s after two level minutes.
    let n = 500;
    let pressure: Vec<f64> = (0..n)
        .map(|i| if i < 120 { 500.0 } else { (380.0 + i as f64).min(800.0) })
        .collect();
    let table = TimeSeries::regular(t0(), 1, n)
        .unwrap()
        .with_channel("WOW_IND", vec![0.0; n])
        .unwrap()
        .with_channel("PS_RVSM", pressure)
        .unwrap();
    let loaders = ModelLoaders::new()
        .with(ModelKind::FlatVariable, MemoryLoader::new())
        .with(ModelKind::HierarchicalGroup, MemoryLoader::new().with(ccp, table));

    let profiles = catalog
        .analysis("c224", &loaders)
        .unwrap()
        .with_hook("ccp")
        .profiles(&ProfileParams::default())
        .unwrap();
    assert_eq!(profiles.descending.len(), 1);
    assert!(profiles.ascending.is_empty());
}

/// Without the netCDF reader compiled in, data products name their family.
#[cfg(not(feature = "netcdf"))]
#[test]
fn e2e_native_build_reports_missing_reader() {
    let dir = tempfile::tempdir().unwrap();
    touch(dir.path(), "core_faam_20200130_v005_r0_c224.nc");

    let (catalog, _) = scan(&[dir.path().to_path_buf()]);
    let loaders = faamcat::app::readers::native_loaders();
    let err = catalog
        .analysis("c224", &loaders)
        .unwrap()
        .level_runs(&LevelRunParams::default())
        .unwrap_err();
    assert!(matches!(
        err,
        FaamError::Series(faamcat::util::error::SeriesError::NoLoader {
            model: ModelKind::FlatVariable,
            ..
        })
    ));
}
