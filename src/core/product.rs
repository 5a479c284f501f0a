// faamcat - core/product.rs
//
// Product definition loading, validation, and filename classification.
// Core layer: accepts TOML strings and file names, never touches the
// filesystem. I/O is handled by app::product_mgr which feeds content here.

use crate::core::model::{FileRecord, Frequency, ModelKind, Product};
use crate::util::constants;
use crate::util::error::{ClassificationError, ProductError};
use chrono::NaiveDate;
use regex::{Captures, Regex, RegexBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// =============================================================================
// TOML deserialization structures (raw input)
// =============================================================================

/// Raw TOML product definition as deserialized from a .toml file.
/// This is validated and compiled into a `Product` for runtime use.
#[derive(Debug, Deserialize)]
pub struct ProductDefinition {
    pub product: ProductMeta,
    pub pattern: PatternDef,
}

#[derive(Debug, Deserialize)]
pub struct ProductMeta {
    pub hook: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub model: ModelKind,
}

#[derive(Debug, Deserialize)]
pub struct PatternDef {
    pub filename: String,
}

// =============================================================================
// Validation and compilation
// =============================================================================

/// Parse a TOML string into a `ProductDefinition`.
///
/// `source_path` is used for error messages only (not for I/O).
pub fn parse_product_toml(
    toml_content: &str,
    source_path: &Path,
) -> Result<ProductDefinition, ProductError> {
    toml::from_str(toml_content).map_err(|e| ProductError::TomlParse {
        path: source_path.to_path_buf(),
        source: e,
    })
}

/// Validate a `ProductDefinition` and compile it into a runtime `Product`.
///
/// Validates:
/// - `product.hook` and `pattern.filename` are non-empty
/// - the pattern compiles and is within size limits
/// - the pattern captures `date` and `flightnum`, and nothing unknown
pub fn validate_and_compile(
    def: ProductDefinition,
    is_builtin: bool,
) -> Result<Product, ProductError> {
    let hook = def.product.hook.trim().to_string();

    if hook.is_empty() {
        return Err(ProductError::MissingField {
            hook: "(empty)".to_string(),
            field: "product.hook",
        });
    }
    if def.pattern.filename.is_empty() {
        return Err(ProductError::MissingField {
            hook,
            field: "pattern.filename",
        });
    }

    let pattern = compile_regex(&hook, &def.pattern.filename)?;

    let captures: Vec<&str> = pattern.capture_names().flatten().collect();
    for required in constants::REQUIRED_CAPTURES {
        if !captures.contains(required) {
            return Err(ProductError::MissingCapture {
                hook,
                capture: required,
            });
        }
    }
    if let Some(unknown) = captures
        .iter()
        .find(|c| !constants::KNOWN_CAPTURES.contains(c))
    {
        return Err(ProductError::UnknownCapture {
            hook,
            capture: (*unknown).to_string(),
        });
    }

    let name = if def.product.name.is_empty() {
        hook.clone()
    } else {
        def.product.name
    };

    Ok(Product {
        hook,
        name,
        description: def.product.description,
        model: def.product.model,
        pattern,
        is_builtin,
    })
}

/// Compile a case-insensitive filename pattern with length validation.
fn compile_regex(hook: &str, pattern: &str) -> Result<Regex, ProductError> {
    if pattern.len() > constants::MAX_REGEX_PATTERN_LENGTH {
        return Err(ProductError::RegexTooLong {
            hook: hook.to_string(),
            length: pattern.len(),
            max_length: constants::MAX_REGEX_PATTERN_LENGTH,
        });
    }

    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| ProductError::InvalidRegex {
            hook: hook.to_string(),
            pattern: pattern.to_string(),
            source: e,
        })
}

// =============================================================================
// Built-in products (embedded at compile time)
// =============================================================================

/// Embedded TOML content for built-in products, in registration order.
/// Each tuple is (filename, TOML content).
pub fn builtin_product_sources() -> Vec<(&'static str, &'static str)> {
    vec![
        ("core.toml", include_str!("../../products/core.toml")),
        (
            "core_flight_summary.toml",
            include_str!("../../products/core_flight_summary.toml"),
        ),
        ("ccp.toml", include_str!("../../products/ccp.toml")),
        ("ccp_cip15.toml", include_str!("../../products/ccp_cip15.toml")),
        ("ccp_cip25.toml", include_str!("../../products/ccp_cip25.toml")),
        (
            "ccp_cip100.toml",
            include_str!("../../products/ccp_cip100.toml"),
        ),
        ("ccp_cas.toml", include_str!("../../products/ccp_cas.toml")),
        (
            "ccp_cdp_cal.toml",
            include_str!("../../products/ccp_cdp_cal.toml"),
        ),
        (
            "ccp_pcasp_cal.toml",
            include_str!("../../products/ccp_pcasp_cal.toml"),
        ),
    ]
}

/// Load and validate all built-in products.
///
/// Invalid products are logged and skipped (non-fatal).
pub fn load_builtin_products() -> Vec<Product> {
    let mut products = Vec::new();

    for (filename, content) in builtin_product_sources() {
        let path = PathBuf::from(format!("<builtin>/{filename}"));
        match parse_product_toml(content, &path).and_then(|def| validate_and_compile(def, true)) {
            Ok(product) => {
                tracing::debug!(hook = %product.hook, "Loaded built-in product");
                products.push(product);
            }
            Err(e) => {
                tracing::error!(file = filename, error = %e, "Failed to load built-in product");
            }
        }
    }

    products
}

// =============================================================================
// Registry
// =============================================================================

/// A filename that matched a product pattern, routed to its flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub hook: String,
    pub flight_number: String,
    pub date: NaiveDate,
    pub record: FileRecord,
}

/// The closed set of products a catalogue scan classifies against.
///
/// Built once before a scan and never modified afterwards. Iteration order
/// is registration order, which is also match priority.
#[derive(Debug, Clone, Default)]
pub struct ProductRegistry {
    products: Vec<Product>,
}

impl ProductRegistry {
    /// Build a registry. A hook registered twice keeps its first definition.
    pub fn new(products: Vec<Product>) -> Self {
        let mut unique: Vec<Product> = Vec::with_capacity(products.len());
        for product in products {
            if unique.iter().any(|p| p.hook == product.hook) {
                tracing::warn!(hook = %product.hook, "Duplicate product hook ignored");
                continue;
            }
            unique.push(product);
        }
        Self { products: unique }
    }

    /// Registry of the built-in products only.
    pub fn builtin() -> Self {
        Self::new(load_builtin_products())
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn get(&self, hook: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.hook == hook)
    }

    pub fn hooks(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|p| p.hook.as_str())
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Every hook whose pattern matches `file_name`, in priority order.
    pub fn matching_hooks(&self, file_name: &str) -> Vec<&str> {
        self.products
            .iter()
            .filter(|p| p.pattern.is_match(file_name))
            .map(|p| p.hook.as_str())
            .collect()
    }

    /// Classify a file by its basename.
    ///
    /// Returns `None` when no product matches. When several match, the first
    /// registered product wins.
    pub fn classify(&self, path: &Path) -> Option<Result<Classified, ClassificationError>> {
        let file_name = match path.file_name().map(|n| n.to_str()) {
            Some(Some(name)) => name,
            Some(None) => {
                return Some(Err(ClassificationError::NonUtf8Name {
                    path: path.to_path_buf(),
                }))
            }
            None => return None,
        };

        let (product, caps) = self
            .products
            .iter()
            .find_map(|p| p.pattern.captures(file_name).map(|c| (p, c)))?;

        Some(build_classified(product, path, &caps))
    }
}

/// Turn the captures of a matched filename into a routed `FileRecord`.
fn build_classified(
    product: &Product,
    path: &Path,
    caps: &Captures<'_>,
) -> Result<Classified, ClassificationError> {
    let hook = product.hook.clone();

    let flight_number = capture(caps, "flightnum").unwrap_or_default().to_string();
    if flight_number.is_empty() {
        return Err(ClassificationError::MissingFlightNumber {
            path: path.to_path_buf(),
            hook,
        });
    }

    let raw_date = capture(caps, "date").unwrap_or_default();
    let date = NaiveDate::parse_from_str(raw_date, constants::FILENAME_DATE_FORMAT).map_err(
        |e| ClassificationError::InvalidDate {
            path: path.to_path_buf(),
            hook: hook.clone(),
            raw: raw_date.to_string(),
            source: e,
        },
    )?;

    let version = parse_number(caps, "version", path, &hook)?;
    let revision = parse_number(caps, "revision", path, &hook)?;

    // No rate in the name means the unsplit full-rate file.
    let frequency = match parse_number(caps, "freq", path, &hook)? {
        Some(hz) if hz > 0 => Frequency::Hz(hz),
        _ => Frequency::Full,
    };

    let extension = capture(caps, "ext").map(str::to_string);

    Ok(Classified {
        hook,
        flight_number,
        date,
        record: FileRecord::new(path, version, revision, frequency, extension),
    })
}

/// A named capture, treating an empty match as absent.
fn capture<'t>(caps: &Captures<'t>, name: &str) -> Option<&'t str> {
    caps.name(name).map(|m| m.as_str()).filter(|s| !s.is_empty())
}

fn parse_number(
    caps: &Captures<'_>,
    field: &'static str,
    path: &Path,
    hook: &str,
) -> Result<Option<u32>, ClassificationError> {
    match capture(caps, field) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ClassificationError::InvalidNumber {
                path: path.to_path_buf(),
                hook: hook.to_string(),
                field,
                raw: raw.to_string(),
            }),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_PRODUCT_TOML: &str = r#"
[product]
hook = "test"
name = "Test Product"
description = "A test product"
model = "flat-variable"

[pattern]
filename = '^test_(?P<date>\d{8})_v(?P<version>\d+)_r(?P<revision>\d+)_(?P<flightnum>[a-z]\d{3})\.(?P<ext>nc)$'
"#;

    fn compile(toml: &str) -> Result<Product, ProductError> {
        let path = PathBuf::from("test.toml");
        let def = parse_product_toml(toml, &path)?;
        validate_and_compile(def, false)
    }

    fn classify_ok(registry: &ProductRegistry, name: &str) -> Classified {
        registry
            .classify(Path::new(name))
            .expect("should match a product")
            .expect("should classify")
    }

    #[test]
    fn test_compile_valid_product() {
        let product = compile(VALID_PRODUCT_TOML).unwrap();
        assert_eq!(product.hook, "test");
        assert_eq!(product.name, "Test Product");
        assert_eq!(product.model, ModelKind::FlatVariable);
        assert!(!product.is_builtin);
    }

    #[test]
    fn test_missing_hook() {
        let toml = r#"
[product]
hook = ""

[pattern]
filename = '(?P<date>\d{8})_(?P<flightnum>\w+)'
"#;
        match compile(toml).unwrap_err() {
            ProductError::MissingField { field, .. } => assert_eq!(field, "product.hook"),
            other => panic!("Expected MissingField, got: {other:?}"),
        }
    }

    #[test]
    fn test_missing_mandatory_capture() {
        let toml = r#"
[product]
hook = "nodate"

[pattern]
filename = '^x_(?P<flightnum>[a-z]\d{3})\.nc$'
"#;
        assert!(matches!(
            compile(toml).unwrap_err(),
            ProductError::MissingCapture {
                capture: "date",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_capture_rejected() {
        let toml = r#"
[product]
hook = "extra"

[pattern]
filename = '^(?P<date>\d{8})_(?P<flightnum>[a-z]\d{3})_(?P<instrument>\w+)$'
"#;
        assert!(matches!(
            compile(toml).unwrap_err(),
            ProductError::UnknownCapture { .. }
        ));
    }

    #[test]
    fn test_invalid_regex() {
        let toml = r#"
[product]
hook = "bad"

[pattern]
filename = "[invalid"
"#;
        assert!(matches!(
            compile(toml).unwrap_err(),
            ProductError::InvalidRegex { .. }
        ));
    }

    #[test]
    fn test_regex_too_long() {
        let long_pattern = "a".repeat(constants::MAX_REGEX_PATTERN_LENGTH + 1);
        let toml = format!(
            r#"
[product]
hook = "long"

[pattern]
filename = '{long_pattern}'
"#
        );
        assert!(matches!(
            compile(&toml).unwrap_err(),
            ProductError::RegexTooLong { .. }
        ));
    }

    #[test]
    fn test_load_builtin_products_in_registration_order() {
        let products = load_builtin_products();
        let hooks: Vec<&str> = products.iter().map(|p| p.hook.as_str()).collect();
        assert_eq!(
            hooks,
            vec![
                "core",
                "corefltsum",
                "ccp",
                "ccpCIP15",
                "ccpCIP25",
                "ccpCIP100",
                "ccpCAS",
                "ccpCDPcal",
                "ccpPCASPcal"
            ]
        );
        assert!(products.iter().all(|p| p.is_builtin));
    }

    #[test]
    fn test_classify_core_split_and_full_rate() {
        let registry = ProductRegistry::builtin();

        let split = classify_ok(&registry, "/data/core_faam_20200130_v005_r1_c224_1hz.nc");
        assert_eq!(split.hook, "core");
        assert_eq!(split.flight_number, "c224");
        assert_eq!(split.date, NaiveDate::from_ymd_opt(2020, 1, 30).unwrap());
        assert_eq!(split.record.version(), Some(5));
        assert_eq!(split.record.revision(), Some(1));
        assert_eq!(split.record.frequency(), Frequency::Hz(1));
        assert_eq!(split.record.extension(), Some("nc"));
        assert_eq!(
            split.record.path(),
            Path::new("/data/core_faam_20200130_v005_r1_c224_1hz.nc")
        );

        let full = classify_ok(&registry, "core_faam_20200130_v005_r1_c224.nc");
        assert_eq!(full.record.frequency(), Frequency::Full);
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let registry = ProductRegistry::builtin();
        let c = classify_ok(&registry, "CORE_FAAM_20200130_V005_R0_C224_32HZ.NC");
        assert_eq!(c.hook, "core");
        assert_eq!(c.flight_number, "C224");
        assert_eq!(c.record.frequency(), Frequency::Hz(32));
    }

    #[test]
    fn test_classify_flight_summary_has_no_version() {
        let registry = ProductRegistry::builtin();
        let c = classify_ok(&registry, "flight-sum_faam_20200130_r0_c224.csv");
        assert_eq!(c.hook, "corefltsum");
        assert_eq!(c.record.version(), None);
        assert_eq!(c.record.revision(), Some(0));
        assert_eq!(c.record.frequency(), Frequency::Full);
        assert_eq!(c.record.extension(), Some("csv"));
    }

    #[test]
    fn test_classify_unmatched_returns_none() {
        let registry = ProductRegistry::builtin();
        assert!(registry.classify(Path::new("notes.txt")).is_none());
        assert!(registry
            .classify(Path::new("core_faam_2020_v005_r0_c224.nc"))
            .is_none());
    }

    #[test]
    fn test_invalid_calendar_date_is_classification_error() {
        let registry = ProductRegistry::builtin();
        let result = registry
            .classify(Path::new("core_faam_20201345_v005_r0_c224.nc"))
            .expect("pattern matches");
        assert!(matches!(
            result,
            Err(ClassificationError::InvalidDate { .. })
        ));
    }

    /// Every built-in product must be the only match for its own filenames,
    /// so registration order never decides between built-ins.
    #[test]
    fn test_builtin_patterns_are_disjoint() {
        let registry = ProductRegistry::builtin();
        let samples = [
            ("core_faam_20200130_v005_r0_c224.nc", "core"),
            ("core_faam_20200130_v005_r0_c224_1hz.nc", "core"),
            ("flight-sum_faam_20200130_r0_c224.csv", "corefltsum"),
            ("flight-sum_faam_20200130_r0_c224.txt", "corefltsum"),
            ("core-cloud-phy_faam_20200130_v501_r0_c224.nc", "ccp"),
            ("core-cloud-phy_faam_20200130_v501_r0_c224_cip15.nc", "ccpCIP15"),
            ("core-cloud-phy_faam_20200130_v501_r0_c224_cip25.nc", "ccpCIP25"),
            ("core-cloud-phy_faam_20200130_v501_r0_c224_cip100.nc", "ccpCIP100"),
            ("core-cloud-phy_faam_20200130_v501_r0_c224_cas.nc", "ccpCAS"),
            ("CDP-1_faam_20200130_v001_r0_cal.nc", "ccpCDPcal"),
            ("PCASP-0_faam_20200130_v001_r0_cal.nc", "ccpPCASPcal"),
        ];
        for (name, hook) in samples {
            assert_eq!(registry.matching_hooks(name), vec![hook], "{name}");
        }
    }

    #[test]
    fn test_overlapping_patterns_first_registered_wins() {
        let broad = compile(
            r#"
[product]
hook = "broad"

[pattern]
filename = '^(?P<date>\d{8})_(?P<flightnum>[a-z]\d{3}).*$'
"#,
        )
        .unwrap();
        let narrow = compile(
            r#"
[product]
hook = "narrow"

[pattern]
filename = '^(?P<date>\d{8})_(?P<flightnum>[a-z]\d{3})_r(?P<revision>\d+)\.nc$'
"#,
        )
        .unwrap();

        let name = "20200130_c224_r2.nc";

        let registry = ProductRegistry::new(vec![broad.clone(), narrow.clone()]);
        assert_eq!(registry.matching_hooks(name), vec!["broad", "narrow"]);
        assert_eq!(classify_ok(&registry, name).hook, "broad");

        let reversed = ProductRegistry::new(vec![narrow, broad]);
        let c = classify_ok(&reversed, name);
        assert_eq!(c.hook, "narrow");
        assert_eq!(c.record.revision(), Some(2));
    }

    #[test]
    fn test_duplicate_hook_keeps_first_definition() {
        let first = compile(VALID_PRODUCT_TOML).unwrap();
        let mut second = first.clone();
        second.name = "Second".to_string();
        let registry = ProductRegistry::new(vec![first, second]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("test").unwrap().name, "Test Product");
    }
}
