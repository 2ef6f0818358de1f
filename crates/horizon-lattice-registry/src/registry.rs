//! Layered application settings.
//!
//! A [`Registry`] merges up to six settings tiers into one [`Settings`] view:
//!
//! | Order | Tier | Location | Mark |
//! |-------|------|----------|------|
//! | 1 | system common | first match of `lattice.rc` on the search path | no |
//! | 2 | system vendor | `<Vendor>/<Vendor>.rc` on the search path | no |
//! | 3 | system application | `<Vendor>/<App>.rc` (or `<App>.rc`) on the search path | no |
//! | 4 | user common | `<user dir>/lattice.rc` | no |
//! | 5 | user vendor | `<user dir>/<Vendor>/<Vendor>.rc` | no |
//! | 6 | user application | `<user dir>/<Vendor>/<App>.rc` (or `<App>.rc`) | yes |
//!
//! Only the user application tier is ever written back, and only its marked
//! entries: those loaded from that tier and those written at runtime.
//!
//! # Example
//!
//! ```no_run
//! use horizon_lattice_registry::Registry;
//!
//! let mut registry = Registry::new("Editor", "Acme");
//! registry.read();
//!
//! let width = registry.read_int("Window", "width", 800);
//! registry.write_int("Window", "width", width + 10);
//!
//! if let Err(e) = registry.write() {
//!     eprintln!("preferences not saved: {e}");
//! }
//! ```

use std::env;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::{debug, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::settings::Settings;

/// Toolkit-wide subdirectory of the user configuration directory.
pub const TOOLKIT_DIR: &str = "lattice";

/// Name of the common settings file shared by all applications.
pub const COMMON_FILE: &str = "lattice.rc";

/// Extension of vendor and application settings files.
pub const FILE_EXTENSION: &str = "rc";

#[cfg(unix)]
const DEFAULT_SYSTEM_PATH: &str = "/etc:/usr/lib:/usr/local/lib";
#[cfg(not(unix))]
const DEFAULT_SYSTEM_PATH: &str = "";

/// One layer of the registry, in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    SystemCommon,
    SystemVendor,
    SystemApplication,
    UserCommon,
    UserVendor,
    UserApplication,
}

impl Tier {
    /// All tiers in the order they are loaded.
    pub const ALL: [Tier; 6] = [
        Tier::SystemCommon,
        Tier::SystemVendor,
        Tier::SystemApplication,
        Tier::UserCommon,
        Tier::UserVendor,
        Tier::UserApplication,
    ];

    /// Returns true for tiers found under the per-user directory.
    pub fn is_user(self) -> bool {
        matches!(self, Tier::UserCommon | Tier::UserVendor | Tier::UserApplication)
    }

    /// Returns the mark given to entries loaded from this tier.
    pub fn mark(self) -> bool {
        self == Tier::UserApplication
    }
}

/// A platform settings store used in place of files.
///
/// Groups are named the way tier files are, without extension: `lattice`
/// for the common tier, `<Vendor>` for the vendor tier and `<Vendor>/<App>`
/// or `<App>` for the application tier.
pub trait NativeRegistry: Send {
    /// Loads one group into `settings`, giving every entry `mark`.
    ///
    /// Returns `Ok(false)` if the group does not exist.
    fn load(
        &mut self,
        tier: Tier,
        group: &str,
        settings: &mut Settings,
        mark: bool,
    ) -> RegistryResult<bool>;

    /// Replaces the per-user `group` with the marked entries of `settings`.
    fn store(&mut self, group: &str, settings: &Settings) -> RegistryResult<()>;
}

/// Settings merged from system-wide and per-user tiers.
///
/// Dereferences to [`Settings`] for all reads and writes.
pub struct Registry {
    settings: Settings,
    app_key: String,
    vendor_key: String,
    system_dirs: Vec<PathBuf>,
    user_dir: Option<PathBuf>,
    ascii_mode: bool,
    native: Option<Box<dyn NativeRegistry>>,
}

impl Registry {
    /// Creates a registry for an application and optional vendor.
    ///
    /// An empty key means the corresponding tiers are not used.
    pub fn new(app_key: impl Into<String>, vendor_key: impl Into<String>) -> Self {
        Self {
            settings: Settings::new(),
            app_key: app_key.into(),
            vendor_key: vendor_key.into(),
            system_dirs: env::split_paths(DEFAULT_SYSTEM_PATH)
                .filter(|p| !p.as_os_str().is_empty())
                .collect(),
            user_dir: BaseDirs::new().map(|dirs| dirs.config_dir().join(TOOLKIT_DIR)),
            ascii_mode: cfg!(not(windows)),
            native: None,
        }
    }

    // ========================================================================
    // Configuration
    // ========================================================================

    /// Returns the application key.
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Returns the vendor key.
    pub fn vendor_key(&self) -> &str {
        &self.vendor_key
    }

    /// Returns the directories searched for system-wide tiers.
    pub fn system_dirs(&self) -> &[PathBuf] {
        &self.system_dirs
    }

    /// Returns the system search path joined with the platform separator.
    pub fn system_path(&self) -> String {
        env::join_paths(&self.system_dirs)
            .map(|joined| joined.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Sets the system search path from a separator-delimited list.
    pub fn set_system_path(&mut self, path: &str) {
        self.system_dirs = env::split_paths(path)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
    }

    /// Returns the per-user settings directory.
    pub fn user_dir(&self) -> Option<&Path> {
        self.user_dir.as_deref()
    }

    /// Sets the per-user settings directory.
    pub fn set_user_dir(&mut self, dir: impl Into<PathBuf>) {
        self.user_dir = Some(dir.into());
    }

    /// Returns true if tiers are kept in files rather than a native store.
    pub fn ascii_mode(&self) -> bool {
        self.ascii_mode
    }

    /// Chooses between files and the installed native store.
    pub fn set_ascii_mode(&mut self, ascii: bool) {
        self.ascii_mode = ascii;
    }

    /// Installs a native store, used whenever ascii mode is off.
    pub fn set_native(&mut self, native: Box<dyn NativeRegistry>) {
        self.native = Some(native);
    }

    fn uses_native(&self) -> bool {
        !self.ascii_mode && self.native.is_some()
    }

    // ========================================================================
    // Tier naming
    // ========================================================================

    /// Returns the group name of a tier, relative to its root, without
    /// extension, or `None` if the tier does not apply.
    fn group(&self, tier: Tier) -> Option<PathBuf> {
        let vendor = (!self.vendor_key.is_empty()).then_some(self.vendor_key.as_str());
        let app = (!self.app_key.is_empty()).then_some(self.app_key.as_str());
        match tier {
            Tier::SystemCommon | Tier::UserCommon => Some(PathBuf::from(TOOLKIT_DIR)),
            Tier::SystemVendor | Tier::UserVendor => vendor.map(|v| Path::new(v).join(v)),
            Tier::SystemApplication | Tier::UserApplication => app.map(|a| match vendor {
                Some(v) => Path::new(v).join(a),
                None => PathBuf::from(a),
            }),
        }
    }

    /// Returns the file name of a tier relative to its root directory.
    fn relative_file(&self, tier: Tier) -> Option<PathBuf> {
        if matches!(tier, Tier::SystemCommon | Tier::UserCommon) {
            return Some(PathBuf::from(COMMON_FILE));
        }
        self.group(tier).map(|g| g.with_extension(FILE_EXTENSION))
    }

    /// Returns the settings file backing a tier, if one exists or, for the
    /// user application tier, would be written.
    pub fn tier_file(&self, tier: Tier) -> Option<PathBuf> {
        let relative = self.relative_file(tier)?;
        if tier.is_user() {
            return self.user_dir.as_ref().map(|dir| dir.join(relative));
        }
        self.system_dirs
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|path| path.is_file())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Loads all tiers in precedence order.
    ///
    /// Missing tiers are skipped. Returns the number of tiers found. The
    /// modified flag is clear afterwards.
    pub fn read(&mut self) -> usize {
        let mut loaded = 0;
        for tier in Tier::ALL {
            if self.read_tier(tier) {
                loaded += 1;
            }
        }
        self.settings.set_modified(false);
        loaded
    }

    fn read_tier(&mut self, tier: Tier) -> bool {
        if self.uses_native() {
            let Some(group) = self.group(tier) else {
                return false;
            };
            let group = group.to_string_lossy().replace('\\', "/");
            let Some(native) = self.native.as_mut() else {
                return false;
            };
            return match native.load(tier, &group, &mut self.settings, tier.mark()) {
                Ok(found) => found,
                Err(e) => {
                    warn!(
                        target: "horizon_lattice_registry::registry",
                        ?tier,
                        group,
                        error = %e,
                        "failed to load native settings group"
                    );
                    false
                }
            };
        }

        let Some(path) = self.tier_file(tier) else {
            debug!(
                target: "horizon_lattice_registry::registry",
                ?tier,
                "settings tier not present"
            );
            return false;
        };
        match self.settings.parse_file(&path, tier.mark()) {
            Ok(()) => true,
            Err(e) => {
                debug!(
                    target: "horizon_lattice_registry::registry",
                    ?tier,
                    path = %path.display(),
                    error = %e,
                    "settings tier skipped"
                );
                false
            }
        }
    }

    /// Persists the user application tier if anything was modified.
    ///
    /// On failure the modified flag stays set so the write can be retried.
    pub fn write(&mut self) -> RegistryResult<()> {
        if !self.settings.is_modified() {
            return Ok(());
        }
        match self.write_user_application() {
            Ok(()) => {
                self.settings.set_modified(false);
                Ok(())
            }
            Err(e) => {
                warn!(
                    target: "horizon_lattice_registry::registry",
                    app = %self.app_key,
                    error = %e,
                    "failed to save settings"
                );
                Err(e)
            }
        }
    }

    fn write_user_application(&mut self) -> RegistryResult<()> {
        if self.app_key.is_empty() {
            return Err(RegistryError::NoApplicationKey);
        }

        if self.uses_native() {
            let group = self
                .group(Tier::UserApplication)
                .ok_or(RegistryError::NoApplicationKey)?
                .to_string_lossy()
                .replace('\\', "/");
            return match self.native.as_mut() {
                Some(native) => native.store(&group, &self.settings),
                None => Err(RegistryError::Native("no native registry installed".into())),
            };
        }

        let path = self
            .tier_file(Tier::UserApplication)
            .ok_or(RegistryError::NoUserDirectory)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RegistryError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.settings.unparse_file(&path)
    }
}

impl Deref for Registry {
    type Target = Settings;

    fn deref(&self) -> &Settings {
        &self.settings
    }
}

impl DerefMut for Registry {
    fn deref_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("app_key", &self.app_key)
            .field("vendor_key", &self.vendor_key)
            .field("system_dirs", &self.system_dirs)
            .field("user_dir", &self.user_dir)
            .field("ascii_mode", &self.ascii_mode)
            .field("native", &self.native.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn registry_in(system: &TempDir, user: &TempDir, app: &str, vendor: &str) -> Registry {
        let mut registry = Registry::new(app, vendor);
        registry.set_ascii_mode(true);
        registry.set_system_path(&system.path().to_string_lossy());
        registry.set_user_dir(user.path());
        registry
    }

    fn put(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_tier_files() {
        let system = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let registry = registry_in(&system, &user, "Editor", "Acme");

        assert_eq!(
            registry.tier_file(Tier::UserApplication),
            Some(user.path().join("Acme").join("Editor.rc"))
        );
        assert_eq!(
            registry.tier_file(Tier::UserVendor),
            Some(user.path().join("Acme").join("Acme.rc"))
        );
        assert_eq!(registry.tier_file(Tier::SystemCommon), None);

        put(system.path(), "lattice.rc", "");
        assert_eq!(
            registry.tier_file(Tier::SystemCommon),
            Some(system.path().join("lattice.rc"))
        );

        let plain = registry_in(&system, &user, "Editor", "");
        assert_eq!(
            plain.tier_file(Tier::UserApplication),
            Some(user.path().join("Editor.rc"))
        );
        assert_eq!(plain.tier_file(Tier::UserVendor), None);
    }

    #[test]
    fn test_tiers_merge_in_order() {
        let system = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        put(system.path(), "lattice.rc", "[S]\ncommon=system\nall=system\n");
        put(system.path(), "Acme/Acme.rc", "[S]\nvendor=system\nall=vendor\n");
        put(system.path(), "Acme/Editor.rc", "[S]\nall=sysapp\n");
        put(user.path(), "lattice.rc", "[S]\ncommon=user\n");
        put(user.path(), "Acme/Editor.rc", "[S]\nmine=yes\nall=userapp\n");

        let mut registry = registry_in(&system, &user, "Editor", "Acme");
        assert_eq!(registry.read(), 5);

        assert_eq!(registry.read_string("S", "common"), Some("user"));
        assert_eq!(registry.read_string("S", "vendor"), Some("system"));
        assert_eq!(registry.read_string("S", "all"), Some("userapp"));
        assert!(!registry.is_modified());
        assert_eq!(registry.unparse(), "[S]\nall=userapp\nmine=yes\n");
    }

    #[test]
    fn test_write_is_noop_when_unmodified() {
        let system = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let mut registry = registry_in(&system, &user, "Editor", "");
        registry.read();
        registry.write().unwrap();
        assert!(!user.path().join("Editor.rc").exists());
    }

    #[test]
    fn test_write_requires_app_key() {
        let system = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let mut registry = registry_in(&system, &user, "", "");
        registry.write_int("S", "k", 1);
        assert!(matches!(registry.write(), Err(RegistryError::NoApplicationKey)));
        assert!(registry.is_modified());
    }

    #[test]
    fn test_failed_write_keeps_modified() {
        let system = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let blocker = user.path().join("Acme");
        fs::write(&blocker, "not a directory").unwrap();

        let mut registry = registry_in(&system, &user, "Editor", "Acme");
        registry.write_int("S", "k", 1);
        assert!(matches!(registry.write(), Err(RegistryError::CreateDir { .. })));
        assert!(registry.is_modified());
    }

    #[test]
    fn test_failed_rename_keeps_modified() {
        let system = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        // A directory where the settings file belongs cannot be replaced.
        put(user.path(), "Acme/Editor.rc/keep", "occupied");

        let mut registry = registry_in(&system, &user, "Editor", "Acme");
        registry.write_int("S", "k", 1);
        assert!(matches!(registry.write(), Err(RegistryError::Persist { .. })));
        assert!(registry.is_modified());

        let leftovers: Vec<_> = fs::read_dir(user.path().join("Acme"))
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        assert!(user.path().join("Acme/Editor.rc/keep").is_file());
    }

    #[derive(Default, Clone)]
    struct MemoryRegistry {
        groups: Arc<Mutex<HashMap<String, String>>>,
    }

    impl NativeRegistry for MemoryRegistry {
        fn load(
            &mut self,
            _tier: Tier,
            group: &str,
            settings: &mut Settings,
            mark: bool,
        ) -> RegistryResult<bool> {
            let groups = self.groups.lock().unwrap();
            match groups.get(group) {
                Some(text) => {
                    settings.parse_str(text, mark);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn store(&mut self, group: &str, settings: &Settings) -> RegistryResult<()> {
            self.groups
                .lock()
                .unwrap()
                .insert(group.to_owned(), settings.unparse());
            Ok(())
        }
    }

    #[test]
    fn test_native_backend_when_not_ascii() {
        let system = TempDir::new().unwrap();
        let user = TempDir::new().unwrap();
        let store = MemoryRegistry::default();
        store
            .groups
            .lock()
            .unwrap()
            .insert("lattice".into(), "[S]\nshared=1\n".into());

        let mut registry = registry_in(&system, &user, "Editor", "Acme");
        registry.set_native(Box::new(store.clone()));
        registry.set_ascii_mode(false);
        registry.read();
        assert_eq!(registry.read_int("S", "shared", 0), 1);

        registry.write_int("S", "own", 2);
        registry.write().unwrap();
        assert!(!registry.is_modified());
        assert_eq!(
            store.groups.lock().unwrap().get("Acme/Editor").map(String::as_str),
            Some("[S]\nown=2\n")
        );
        assert!(!user.path().join("Acme").exists());
    }
}
