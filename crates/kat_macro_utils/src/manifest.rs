use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use std::time::SystemTime;

use toml_edit::{Document, Item, Table};

/// The caller's `Cargo.toml`, used to spell paths that generated code can
/// reach.
///
/// ```rust
/// # use kat_macro_utils::Manifest;
/// let p: syn::Path = Manifest::shared(|m| m.get_crate_path("kat_schema"));
/// ```
///
/// # Resolution rules
///
/// 1. A direct dependency on the crate gives `::crate_name`.
/// 2. For `kat_*` crates, a dependency on the umbrella crate `kat` gives
///    `::kat::short_name` (`kat_schema` becomes `::kat::schema`).
/// 3. Steps 1 and 2 are repeated over `dev-dependencies`.
/// 4. Otherwise `::crate_name`.
///
/// A crate that derives on its own types needs `extern crate self as name;`
/// so that rule 4 also holds inside it.
#[derive(Debug)]
pub struct Manifest {
    pub manifest: Document<Box<str>>,
    pub modified_time: SystemTime,
}

const UMBRELLA_NAME: &str = "kat";
const CRATE_PREFIX: &str = "kat_";

impl Manifest {
    #[inline(never)]
    fn manifest_path() -> PathBuf {
        let dir = env::var_os("CARGO_MANIFEST_DIR")
            .expect("CARGO_MANIFEST_DIR should be defined by cargo.");
        let mut path = PathBuf::from(dir);
        path.push("Cargo.toml");
        assert!(path.exists(), "no cargo manifest at {}", path.display());
        path
    }

    #[inline(never)]
    fn modified_time(path: &Path) -> Result<SystemTime, std::io::Error> {
        std::fs::metadata(path).and_then(|metadata| metadata.modified())
    }

    #[inline(never)]
    fn read(path: &Path) -> Document<Box<str>> {
        let source = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("cannot read cargo manifest {}", path.display()))
            .into_boxed_str();
        Document::parse(source)
            .unwrap_or_else(|_| panic!("cannot parse cargo manifest {}", path.display()))
    }

    #[inline]
    fn parse<T: syn::parse::Parse>(path: &str) -> T {
        syn::parse_str(path).unwrap_or_else(|_| panic!("`{path}` is not a valid path"))
    }

    fn find(deps: &Table, name: &str) -> Option<syn::Path> {
        if deps.contains_key(name) {
            return Some(Self::parse(&format!("::{name}")));
        }
        let short = name.strip_prefix(CRATE_PREFIX)?;
        if deps.contains_key(UMBRELLA_NAME) {
            let mut path = Self::parse::<syn::Path>(&format!("::{UMBRELLA_NAME}"));
            path.segments.push(Self::parse(short));
            return Some(path);
        }
        None
    }

    /// Returns the path of the crate `name` as seen from the calling crate.
    #[inline(never)]
    pub fn get_crate_path(&self, name: &str) -> syn::Path {
        for table in ["dependencies", "dev-dependencies"] {
            if let Some(Item::Table(deps)) = self.manifest.get(table)
                && let Some(path) = Self::find(deps, name)
            {
                return path;
            }
        }
        Self::parse(&format!("::{name}"))
    }

    /// Runs `func` against the calling crate's manifest.
    ///
    /// Manifests are cached per path and re-read when the file's
    /// modification time changes.
    pub fn shared<R>(func: impl FnOnce(&Self) -> R) -> R {
        static MANIFESTS: RwLock<BTreeMap<PathBuf, Manifest>> = RwLock::new(BTreeMap::new());

        let path = Self::manifest_path();
        let modified_time =
            Self::modified_time(&path).expect("Cargo.toml should have a modified time.");

        let manifests = MANIFESTS.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(manifest) = manifests.get(&path)
            && manifest.modified_time == modified_time
        {
            return func(manifest);
        }
        drop(manifests);

        let manifest = Manifest {
            manifest: Self::read(&path),
            modified_time,
        };
        let result = func(&manifest);

        MANIFESTS
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, manifest);

        result
    }
}
