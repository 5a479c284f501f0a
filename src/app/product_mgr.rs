// faamcat - app/product_mgr.rs
//
// Loads product definitions from both built-in sources (embedded in the
// binary) and user-defined TOML files on disk. A user product with the same
// hook as a built-in replaces it in place.

use crate::core::model::Product;
use crate::core::product::{self, ProductRegistry};
use crate::util::constants;
use crate::util::error::ProductError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Load all available products: built-in first, then user-defined overrides.
///
/// Invalid user products are logged and skipped (non-fatal). Returns the
/// merged list in registration order and any errors encountered.
pub fn load_all_products(user_product_dir: Option<&Path>) -> (Vec<Product>, Vec<ProductError>) {
    let mut products = product::load_builtin_products();
    let mut errors = Vec::new();

    tracing::info!(builtin_count = products.len(), "Loaded built-in products");

    if let Some(dir) = user_product_dir {
        if dir.is_dir() {
            let (user_products, user_errors) = load_user_products(dir);
            errors.extend(user_errors);

            for user_product in user_products {
                if let Some(pos) = products.iter().position(|p| p.hook == user_product.hook) {
                    tracing::info!(hook = %user_product.hook, "User product overrides built-in");
                    products[pos] = user_product;
                } else {
                    tracing::info!(hook = %user_product.hook, "Loaded user-defined product");
                    products.push(user_product);
                }
            }
        } else {
            tracing::debug!(
                dir = %dir.display(),
                "User product directory does not exist (skipping)"
            );
        }
    }

    if products.len() > constants::MAX_PRODUCTS {
        tracing::warn!(
            count = products.len(),
            max = constants::MAX_PRODUCTS,
            "Too many products loaded, truncating"
        );
        errors.push(ProductError::TooManyProducts {
            count: products.len(),
            max: constants::MAX_PRODUCTS,
        });
        products.truncate(constants::MAX_PRODUCTS);
    }

    for e in &errors {
        tracing::warn!(error = %e, "Product definition skipped");
    }
    tracing::info!(total = products.len(), "Product loading complete");

    (products, errors)
}

/// `load_all_products` frozen into a registry.
pub fn build_registry(user_product_dir: Option<&Path>) -> (ProductRegistry, Vec<ProductError>) {
    let (products, errors) = load_all_products(user_product_dir);
    (ProductRegistry::new(products), errors)
}

/// Load user-defined products from a directory, in file-name order.
///
/// A hook declared by more than one file keeps the first definition and
/// reports `DuplicateHook` for the rest.
fn load_user_products(dir: &Path) -> (Vec<Product>, Vec<ProductError>) {
    let mut products = Vec::new();
    let mut errors = Vec::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(ProductError::Io {
                path: dir.to_path_buf(),
                source: e,
            });
            return (products, errors);
        }
    };

    let mut paths = Vec::new();
    for entry_result in entries {
        match entry_result {
            Ok(entry) => paths.push(entry.path()),
            Err(e) => errors.push(ProductError::Io {
                path: dir.to_path_buf(),
                source: e,
            }),
        }
    }
    paths.sort();

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for path in paths {
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }

        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(e) => {
                errors.push(ProductError::Io { path, source: e });
                continue;
            }
        };

        if metadata.len() > constants::MAX_PRODUCT_FILE_SIZE {
            errors.push(ProductError::FileTooLarge {
                size: metadata.len(),
                max_size: constants::MAX_PRODUCT_FILE_SIZE,
                path,
            });
            continue;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                errors.push(ProductError::Io { path, source: e });
                continue;
            }
        };

        let product = match product::parse_product_toml(&content, &path)
            .and_then(|def| product::validate_and_compile(def, false))
        {
            Ok(p) => p,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };

        // First file in name order wins a hook.
        if let Some(first) = seen.get(&product.hook) {
            errors.push(ProductError::DuplicateHook {
                hook: product.hook,
                path1: first.clone(),
                path2: path,
            });
            continue;
        }
        seen.insert(product.hook.clone(), path);
        products.push(product);
    }

    (products, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CUSTOM_CORE: &str = r#"
[product]
hook = "core"
name = "Core (reprocessed)"
model = "flat-variable"

[pattern]
filename = '^core_reproc_(?P<date>[0-9]{8})_(?P<flightnum>[a-z][0-9]{3})\.(?P<ext>nc)$'
"#;

    const NEW_PRODUCT: &str = r#"
[product]
hook = "nevzorov"
name = "Nevzorov sensor"

[pattern]
filename = '^nevzorov_faam_(?P<date>[0-9]{8})_v(?P<version>[0-9]{3})_r(?P<revision>[0-9]+)_(?P<flightnum>[a-z][0-9]{3})\.(?P<ext>nc)$'
"#;

    #[test]
    fn test_builtin_only_without_user_dir() {
        let (products, errors) = load_all_products(None);
        assert!(errors.is_empty());
        assert_eq!(products.len(), product::load_builtin_products().len());
        assert!(products.iter().all(|p| p.is_builtin));
    }

    #[test]
    fn test_user_product_overrides_in_place_and_appends() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("core.toml"), CUSTOM_CORE).unwrap();
        fs::write(dir.path().join("nevzorov.toml"), NEW_PRODUCT).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let builtin_len = product::load_builtin_products().len();
        let (products, errors) = load_all_products(Some(dir.path()));
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(products.len(), builtin_len + 1);

        let core_pos = products.iter().position(|p| p.hook == "core").unwrap();
        assert_eq!(core_pos, 0, "override keeps registration position");
        assert!(!products[core_pos].is_builtin);
        assert_eq!(products[core_pos].name, "Core (reprocessed)");
        assert_eq!(products.last().unwrap().hook, "nevzorov");
    }

    #[test]
    fn test_invalid_user_product_is_non_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.toml"), "[product\nhook=").unwrap();
        fs::write(
            dir.path().join("nodate.toml"),
            "[product]\nhook = \"x\"\n[pattern]\nfilename = '^(?P<flightnum>[a-z][0-9]{3})$'\n",
        )
        .unwrap();

        let (products, errors) = load_all_products(Some(dir.path()));
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ProductError::TomlParse { .. }));
        assert!(matches!(errors[1], ProductError::MissingCapture { capture: "date", .. }));
        assert_eq!(products.len(), product::load_builtin_products().len());
    }

    #[test]
    fn test_duplicate_user_hook_keeps_first_file() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.toml");
        let second = dir.path().join("b.toml");
        fs::write(&first, NEW_PRODUCT).unwrap();
        fs::write(&second, NEW_PRODUCT.replace("Nevzorov sensor", "Second copy")).unwrap();

        let (products, errors) = load_all_products(Some(dir.path()));
        assert_eq!(errors.len(), 1);
        match &errors[0] {
            ProductError::DuplicateHook { hook, path1, path2 } => {
                assert_eq!(hook, "nevzorov");
                assert_eq!(path1, &first);
                assert_eq!(path2, &second);
            }
            other => panic!("expected DuplicateHook, got {other:?}"),
        }

        let nevzorov: Vec<_> = products.iter().filter(|p| p.hook == "nevzorov").collect();
        assert_eq!(nevzorov.len(), 1);
        assert_eq!(nevzorov[0].name, "Nevzorov sensor");
    }

    #[test]
    fn test_missing_user_dir_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let (registry, errors) = build_registry(Some(&dir.path().join("absent")));
        assert!(errors.is_empty());
        assert!(registry.get("core").is_some());
    }
}
